//! Typed operation variants.
//!
//! Each tool's arguments decode into a dedicated struct; `Operation` is the
//! closed set of those structs, one variant per `ToolName`. Defaults for
//! optional parameters live on the structs.

use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- Drive ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveListFiles {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page_size() -> u32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveSearchFiles {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveDownloadFile {
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveCreateFolder {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// --- Docs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsRead {
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsAppendText {
    pub document_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsFindReplace {
    pub document_id: String,
    pub find: String,
    pub replace: String,
}

// --- Sheets ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetsCreate {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetsRead {
    pub spreadsheet_id: String,
    #[serde(default = "default_read_range")]
    pub range_name: String,
}

fn default_read_range() -> String {
    "A1:Z1000".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetsWrite {
    pub spreadsheet_id: String,
    pub range_name: String,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetsAppendRows {
    pub spreadsheet_id: String,
    pub values: Vec<Vec<Value>>,
}

// --- Slides ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidesCreate {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidesGet {
    pub presentation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidesAddSlide {
    pub presentation_id: String,
    #[serde(default = "default_layout")]
    pub layout: String,
}

fn default_layout() -> String {
    "BLANK".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidesAddText {
    pub presentation_id: String,
    pub slide_id: String,
    pub text: String,
}

// --- Calendar ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarListEvents {
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarCreateEvent {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarUpdateEvent {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDeleteEvent {
    pub event_id: String,
}

// --- Gmail ---

/// A message to send or save as a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub bcc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmailListMessages {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmailGetMessage {
    pub message_id: String,
}

fn decode<T: DeserializeOwned>(name: ToolName, args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::InvalidArguments {
        tool: name.to_string(),
        reason: e.to_string(),
    })
}

macro_rules! operations {
    ($($variant:ident($args:ty)),* $(,)?) => {
        /// A fully decoded request for one external operation.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Operation {
            $($variant($args)),*
        }

        impl Operation {
            pub fn name(&self) -> ToolName {
                match self {
                    $(Operation::$variant(_) => ToolName::$variant),*
                }
            }

            /// Decode an argument map into the typed variant for `name`.
            pub fn parse(name: ToolName, args: Map<String, Value>) -> Result<Self, ToolError> {
                match name {
                    $(ToolName::$variant => decode(name, args).map(Operation::$variant)),*
                }
            }

            /// The typed arguments serialized back to JSON.
            pub fn args_value(&self) -> Result<Value, serde_json::Error> {
                match self {
                    $(Operation::$variant(args) => serde_json::to_value(args)),*
                }
            }
        }
    };
}

operations! {
    DriveListFiles(DriveListFiles),
    DriveSearchFiles(DriveSearchFiles),
    DriveDownloadFile(DriveDownloadFile),
    DriveCreateFolder(DriveCreateFolder),
    DocsCreate(DocsCreate),
    DocsRead(DocsRead),
    DocsAppendText(DocsAppendText),
    DocsFindReplace(DocsFindReplace),
    SheetsCreate(SheetsCreate),
    SheetsRead(SheetsRead),
    SheetsWrite(SheetsWrite),
    SheetsAppendRows(SheetsAppendRows),
    SlidesCreate(SlidesCreate),
    SlidesGet(SlidesGet),
    SlidesAddSlide(SlidesAddSlide),
    SlidesAddText(SlidesAddText),
    CalendarListEvents(CalendarListEvents),
    CalendarCreateEvent(CalendarCreateEvent),
    CalendarUpdateEvent(CalendarUpdateEvent),
    CalendarDeleteEvent(CalendarDeleteEvent),
    GmailSend(Email),
    GmailCreateDraft(Email),
    GmailListMessages(GmailListMessages),
    GmailGetMessage(GmailGetMessage),
}
