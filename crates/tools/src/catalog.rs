//! The static tool catalog advertised to the model.
//!
//! One entry per `ToolName`, in `ToolName::ALL` order. The registry checks
//! this table against the typed argument structs at startup.

use deskmate_core::tool::{ParamKind, ParamSpec, ToolName, ToolSpec};

const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: true,
        description,
    }
}

const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        required: false,
        description,
    }
}

use ParamKind::{Integer, Rows, String as Text, StringList};

static CATALOG: [ToolSpec; 24] = [
    // --- Drive ---
    ToolSpec {
        name: ToolName::DriveListFiles,
        description: "Lists files in Google Drive. The query parameter is optional.",
        params: &[
            optional("query", Text, "Drive search query"),
            optional("page_size", Integer, "default 20"),
        ],
    },
    ToolSpec {
        name: ToolName::DriveSearchFiles,
        description: "Searches Google Drive for files by name.",
        params: &[required("name", Text, "file name to search for")],
    },
    ToolSpec {
        name: ToolName::DriveDownloadFile,
        description: "Downloads a file from Google Drive. file_id is required.",
        params: &[required("file_id", Text, "")],
    },
    ToolSpec {
        name: ToolName::DriveCreateFolder,
        description: "Creates a folder in Google Drive.",
        params: &[
            required("name", Text, ""),
            optional("parent_id", Text, "parent folder id"),
        ],
    },
    // --- Docs ---
    ToolSpec {
        name: ToolName::DocsCreate,
        description: "Creates a new Google Docs document.",
        params: &[
            required("title", Text, ""),
            optional("body_text", Text, "initial text"),
        ],
    },
    ToolSpec {
        name: ToolName::DocsRead,
        description: "Reads a Google Docs document. document_id is required.",
        params: &[required("document_id", Text, "")],
    },
    ToolSpec {
        name: ToolName::DocsAppendText,
        description: "Adds text to a Google Docs document.",
        params: &[
            required("document_id", Text, ""),
            required("text", Text, ""),
        ],
    },
    ToolSpec {
        name: ToolName::DocsFindReplace,
        description: "Finds and replaces text in a Google Docs document.",
        params: &[
            required("document_id", Text, ""),
            required("find", Text, ""),
            required("replace", Text, ""),
        ],
    },
    // --- Sheets ---
    ToolSpec {
        name: ToolName::SheetsCreate,
        description: "Creates a new Google Spreadsheet.",
        params: &[
            required("title", Text, ""),
            optional("headers", StringList, "header row"),
        ],
    },
    ToolSpec {
        name: ToolName::SheetsRead,
        description: "Reads values from a Google Spreadsheet.",
        params: &[
            required("spreadsheet_id", Text, ""),
            optional("range_name", Text, "default A1:Z1000"),
        ],
    },
    ToolSpec {
        name: ToolName::SheetsWrite,
        description: "Writes values to a range of a Google Spreadsheet.",
        params: &[
            required("spreadsheet_id", Text, ""),
            required("range_name", Text, ""),
            required("values", Rows, ""),
        ],
    },
    ToolSpec {
        name: ToolName::SheetsAppendRows,
        description: "Appends rows to a Google Spreadsheet.",
        params: &[
            required("spreadsheet_id", Text, ""),
            required("values", Rows, ""),
        ],
    },
    // --- Slides ---
    ToolSpec {
        name: ToolName::SlidesCreate,
        description: "Creates a new Google Slides presentation.",
        params: &[required("title", Text, "")],
    },
    ToolSpec {
        name: ToolName::SlidesGet,
        description: "Gets the details and slide texts of a Google Slides presentation.",
        params: &[required("presentation_id", Text, "")],
    },
    ToolSpec {
        name: ToolName::SlidesAddSlide,
        description: "Adds a new slide to a presentation.",
        params: &[
            required("presentation_id", Text, ""),
            optional("layout", Text, "default BLANK"),
        ],
    },
    ToolSpec {
        name: ToolName::SlidesAddText,
        description: "Adds a text box to a slide.",
        params: &[
            required("presentation_id", Text, ""),
            required("slide_id", Text, ""),
            required("text", Text, ""),
        ],
    },
    // --- Calendar ---
    ToolSpec {
        name: ToolName::CalendarListEvents,
        description: "Lists upcoming events in Google Calendar.",
        params: &[optional("max_results", Integer, "default 10")],
    },
    ToolSpec {
        name: ToolName::CalendarCreateEvent,
        description: "Adds a new event to Google Calendar.",
        params: &[
            required("summary", Text, "event title"),
            required("start_time", Text, "ISO 8601, e.g. 2026-03-01T10:00:00"),
            required("end_time", Text, "ISO 8601"),
            optional("description", Text, ""),
            optional("location", Text, ""),
            optional("attendees", StringList, "e-mail addresses"),
        ],
    },
    ToolSpec {
        name: ToolName::CalendarUpdateEvent,
        description: "Updates an existing calendar event.",
        params: &[
            required("event_id", Text, ""),
            optional("summary", Text, ""),
            optional("start_time", Text, ""),
            optional("end_time", Text, ""),
        ],
    },
    ToolSpec {
        name: ToolName::CalendarDeleteEvent,
        description: "Deletes a calendar event.",
        params: &[required("event_id", Text, "")],
    },
    // --- Gmail ---
    ToolSpec {
        name: ToolName::GmailSend,
        description: "Sends an e-mail through Gmail.",
        params: &[
            required("to", Text, "recipient address"),
            required("subject", Text, ""),
            required("body", Text, "message body, HTML allowed"),
            optional("cc", Text, ""),
            optional("bcc", Text, ""),
        ],
    },
    ToolSpec {
        name: ToolName::GmailCreateDraft,
        description: "Creates a draft in Gmail.",
        params: &[
            required("to", Text, ""),
            required("subject", Text, ""),
            required("body", Text, ""),
            optional("cc", Text, ""),
            optional("bcc", Text, ""),
        ],
    },
    ToolSpec {
        name: ToolName::GmailListMessages,
        description: "Lists messages in the Gmail inbox.",
        params: &[
            optional("query", Text, "Gmail search query"),
            optional("max_results", Integer, "default 10"),
        ],
    },
    ToolSpec {
        name: ToolName::GmailGetMessage,
        description: "Gets the full details of an e-mail.",
        params: &[required("message_id", Text, "")],
    },
];

/// Every catalog entry, in `ToolName::ALL` order.
pub fn catalog() -> &'static [ToolSpec] {
    &CATALOG
}

/// The catalog entry for `name`.
pub fn spec(name: ToolName) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|s| s.name == name)
}
