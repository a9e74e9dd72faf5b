//! Tool vocabulary: names, catalog specs, calls and results.
//!
//! The set of operations is closed: every tool the model may invoke is a
//! `ToolName` variant. The catalog (`ToolSpec`s) advertised in the system
//! prompt and the handlers behind the registry are both keyed by it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use crate::error::ToolError;

/// Identifier of an operation the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    DriveListFiles,
    DriveSearchFiles,
    DriveDownloadFile,
    DriveCreateFolder,
    DocsCreate,
    DocsRead,
    DocsAppendText,
    DocsFindReplace,
    SheetsCreate,
    SheetsRead,
    SheetsWrite,
    SheetsAppendRows,
    SlidesCreate,
    SlidesGet,
    SlidesAddSlide,
    SlidesAddText,
    CalendarListEvents,
    CalendarCreateEvent,
    CalendarUpdateEvent,
    CalendarDeleteEvent,
    GmailSend,
    GmailCreateDraft,
    GmailListMessages,
    GmailGetMessage,
}

impl ToolName {
    /// Every tool, in catalog order.
    pub const ALL: [ToolName; 24] = [
        ToolName::DriveListFiles,
        ToolName::DriveSearchFiles,
        ToolName::DriveDownloadFile,
        ToolName::DriveCreateFolder,
        ToolName::DocsCreate,
        ToolName::DocsRead,
        ToolName::DocsAppendText,
        ToolName::DocsFindReplace,
        ToolName::SheetsCreate,
        ToolName::SheetsRead,
        ToolName::SheetsWrite,
        ToolName::SheetsAppendRows,
        ToolName::SlidesCreate,
        ToolName::SlidesGet,
        ToolName::SlidesAddSlide,
        ToolName::SlidesAddText,
        ToolName::CalendarListEvents,
        ToolName::CalendarCreateEvent,
        ToolName::CalendarUpdateEvent,
        ToolName::CalendarDeleteEvent,
        ToolName::GmailSend,
        ToolName::GmailCreateDraft,
        ToolName::GmailListMessages,
        ToolName::GmailGetMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::DriveListFiles => "drive_list_files",
            ToolName::DriveSearchFiles => "drive_search_files",
            ToolName::DriveDownloadFile => "drive_download_file",
            ToolName::DriveCreateFolder => "drive_create_folder",
            ToolName::DocsCreate => "docs_create",
            ToolName::DocsRead => "docs_read",
            ToolName::DocsAppendText => "docs_append_text",
            ToolName::DocsFindReplace => "docs_find_replace",
            ToolName::SheetsCreate => "sheets_create",
            ToolName::SheetsRead => "sheets_read",
            ToolName::SheetsWrite => "sheets_write",
            ToolName::SheetsAppendRows => "sheets_append_rows",
            ToolName::SlidesCreate => "slides_create",
            ToolName::SlidesGet => "slides_get",
            ToolName::SlidesAddSlide => "slides_add_slide",
            ToolName::SlidesAddText => "slides_add_text",
            ToolName::CalendarListEvents => "calendar_list_events",
            ToolName::CalendarCreateEvent => "calendar_create_event",
            ToolName::CalendarUpdateEvent => "calendar_update_event",
            ToolName::CalendarDeleteEvent => "calendar_delete_event",
            ToolName::GmailSend => "gmail_send",
            ToolName::GmailCreateDraft => "gmail_create_draft",
            ToolName::GmailListMessages => "gmail_list_messages",
            ToolName::GmailGetMessage => "gmail_get_message",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a parameter value, used for prompt rendering and for decoding
/// arguments that arrive as JSON-encoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    StringList,
    Rows,
}

impl ParamKind {
    pub fn label(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::StringList => "list[string]",
            ParamKind::Rows => "list[list]",
        }
    }

    /// Whether a string value for this kind should be decoded as JSON.
    pub fn is_structured(&self) -> bool {
        !matches!(self, ParamKind::String)
    }
}

/// One parameter of a catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

/// A catalog entry advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }
}

/// A directive extracted from model output. Lives only within one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Requested tool name, unvalidated
    pub tool: String,

    /// Arguments as given by the model
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, args: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// Outcome of one dispatched call. Always produced; never an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolResult {
    Ok(serde_json::Value),
    Error(String),
}

impl ToolResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResult::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error(_))
    }
}

impl From<Result<serde_json::Value, ToolError>> for ToolResult {
    fn from(result: Result<serde_json::Value, ToolError>) -> Self {
        match result {
            Ok(value) => ToolResult::Ok(value),
            Err(e) => ToolResult::Error(e.to_string()),
        }
    }
}
