//! Google Workspace backend over the public REST APIs.
//!
//! One submodule per service. Every request carries a bearer token from the
//! configured `CredentialSource`; a missing token or a 401 surfaces as
//! `ToolError::AuthRequired`.

mod calendar;
mod docs;
mod drive;
mod gmail;
mod sheets;
mod slides;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::{Method, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::{self, CredentialSource};
use crate::operation::Operation;
use crate::workspace::Workspace;

/// Base URLs for each Google API.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub drive: String,
    pub docs: String,
    pub sheets: String,
    pub slides: String,
    pub calendar: String,
    pub gmail: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            drive: "https://www.googleapis.com/drive/v3".into(),
            docs: "https://docs.googleapis.com/v1".into(),
            sheets: "https://sheets.googleapis.com/v4".into(),
            slides: "https://slides.googleapis.com/v1".into(),
            calendar: "https://www.googleapis.com/calendar/v3".into(),
            gmail: "https://gmail.googleapis.com/gmail/v1".into(),
        }
    }
}

impl GoogleEndpoints {
    /// Every API under one host, keeping the real version paths.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            drive: format!("{base}/drive/v3"),
            docs: format!("{base}/docs/v1"),
            sheets: format!("{base}/sheets/v4"),
            slides: format!("{base}/slides/v1"),
            calendar: format!("{base}/calendar/v3"),
            gmail: format!("{base}/gmail/v1"),
        }
    }
}

/// Executes operations against Drive, Docs, Sheets, Slides, Calendar and Gmail.
pub struct GoogleWorkspace {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialSource>,
    endpoints: GoogleEndpoints,
    download_dir: PathBuf,
    time_zone: String,
}

impl GoogleWorkspace {
    pub fn new(
        credentials: Arc<dyn CredentialSource>,
        download_dir: impl Into<PathBuf>,
        time_zone: impl Into<String>,
    ) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ToolError::failed("google", format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            endpoints: GoogleEndpoints::default(),
            download_dir: download_dir.into(),
            time_zone: time_zone.into(),
        })
    }

    pub fn from_config(config: &deskmate_config::GoogleConfig) -> Result<Self, ToolError> {
        Self::new(
            credentials::from_config(config),
            config.download_dir.clone(),
            config.time_zone.clone(),
        )
    }

    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialSource> {
        &self.credentials
    }

    /// Append percent-encoded path segments to an API base.
    fn url(&self, tool: ToolName, base: &str, segments: &[&str]) -> Result<Url, ToolError> {
        let mut url = Url::parse(base)
            .map_err(|e| ToolError::failed(tool.as_str(), format!("bad endpoint {base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ToolError::failed(tool.as_str(), format!("bad endpoint {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder, ToolError> {
        let token = self.credentials.access_token().await?;
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    async fn send(&self, tool: ToolName, request: RequestBuilder) -> Result<reqwest::Response, ToolError> {
        let response = request
            .send()
            .await
            .map_err(|e| ToolError::failed(tool.as_str(), e))?;

        let status = response.status();
        debug!(tool = %tool, status = status.as_u16(), "Google API response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 {
            return Err(ToolError::AuthRequired(
                "Google rejected the stored authorization. Please sign in again.".into(),
            ));
        }

        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or(body);
        warn!(tool = %tool, status = status.as_u16(), %message, "Google API error");
        Err(ToolError::failed(
            tool.as_str(),
            format!("HTTP {}: {message}", status.as_u16()),
        ))
    }

    /// Send and decode a JSON body; an empty body decodes to `null`.
    async fn send_json(&self, tool: ToolName, request: RequestBuilder) -> Result<Value, ToolError> {
        let bytes = self
            .send(tool, request)
            .await?
            .bytes()
            .await
            .map_err(|e| ToolError::failed(tool.as_str(), e))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| ToolError::failed(tool.as_str(), format!("invalid JSON response: {e}")))
    }

    async fn send_bytes(&self, tool: ToolName, request: RequestBuilder) -> Result<Vec<u8>, ToolError> {
        let bytes = self
            .send(tool, request)
            .await?
            .bytes()
            .await
            .map_err(|e| ToolError::failed(tool.as_str(), e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Workspace for GoogleWorkspace {
    fn name(&self) -> &str {
        "google"
    }

    async fn is_authorized(&self) -> bool {
        self.credentials.access_token().await.is_ok()
    }

    async fn execute(&self, operation: Operation) -> Result<Value, ToolError> {
        match operation {
            Operation::DriveListFiles(args) => self.drive_list_files(args).await,
            Operation::DriveSearchFiles(args) => self.drive_search_files(args).await,
            Operation::DriveDownloadFile(args) => self.drive_download_file(args).await,
            Operation::DriveCreateFolder(args) => self.drive_create_folder(args).await,
            Operation::DocsCreate(args) => self.docs_create(args).await,
            Operation::DocsRead(args) => self.docs_read(args).await,
            Operation::DocsAppendText(args) => self.docs_append_text(args).await,
            Operation::DocsFindReplace(args) => self.docs_find_replace(args).await,
            Operation::SheetsCreate(args) => self.sheets_create(args).await,
            Operation::SheetsRead(args) => self.sheets_read(args).await,
            Operation::SheetsWrite(args) => self.sheets_write(args).await,
            Operation::SheetsAppendRows(args) => self.sheets_append_rows(args).await,
            Operation::SlidesCreate(args) => self.slides_create(args).await,
            Operation::SlidesGet(args) => self.slides_get(args).await,
            Operation::SlidesAddSlide(args) => self.slides_add_slide(args).await,
            Operation::SlidesAddText(args) => self.slides_add_text(args).await,
            Operation::CalendarListEvents(args) => self.calendar_list_events(args).await,
            Operation::CalendarCreateEvent(args) => self.calendar_create_event(args).await,
            Operation::CalendarUpdateEvent(args) => self.calendar_update_event(args).await,
            Operation::CalendarDeleteEvent(args) => self.calendar_delete_event(args).await,
            Operation::GmailSend(email) => self.gmail_send(email).await,
            Operation::GmailCreateDraft(email) => self.gmail_create_draft(email).await,
            Operation::GmailListMessages(args) => self.gmail_list_messages(args).await,
            Operation::GmailGetMessage(args) => self.gmail_get_message(args).await,
        }
    }
}

/// `value[key]` as an owned string, empty when absent.
fn text(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `value[key]` as a string, or an execution failure naming the key.
fn required_text(tool: ToolName, value: &Value, key: &str) -> Result<String, ToolError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ToolError::failed(tool.as_str(), format!("response has no '{key}'")))
}


#[cfg(test)]
mod tests {
    use super::test_support::workspace_for;
    use super::*;
    use crate::credentials::NoCredentials;
    use crate::operation::DocsRead;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_credentials_require_auth_without_network() {
        let server = MockServer::start().await;
        let workspace = GoogleWorkspace::new(Arc::new(NoCredentials), "/tmp", "UTC")
            .unwrap()
            .with_endpoints(GoogleEndpoints::with_base(&server.uri()));

        assert!(!workspace.is_authorized().await);
        let err = workspace
            .execute(Operation::DocsRead(DocsRead {
                document_id: "d1".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AuthRequired(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/v1/documents/d1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "T"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = workspace_for(&server)
            .execute(Operation::DocsRead(DocsRead {
                document_id: "d1".into(),
            }))
            .await
            .unwrap();
        assert_eq!(result["title"], "T");
    }

    #[tokio::test]
    async fn unauthorized_response_requires_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = workspace_for(&server)
            .execute(Operation::DocsRead(DocsRead {
                document_id: "d1".into(),
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AuthRequired(_)));
    }

    #[tokio::test]
    async fn api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Requested entity was not found."}
            })))
            .mount(&server)
            .await;

        let err = workspace_for(&server)
            .execute(Operation::DocsRead(DocsRead {
                document_id: "missing".into(),
            }))
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("docs_read"));
        assert!(text.contains("404"));
        assert!(text.contains("Requested entity was not found."));
    }

    #[test]
    fn path_segments_are_encoded() {
        let workspace = GoogleWorkspace::new(Arc::new(NoCredentials), "/tmp", "UTC").unwrap();
        let url = workspace
            .url(
                ToolName::SheetsRead,
                "https://sheets.googleapis.com/v4",
                &["spreadsheets", "s1", "values", "My Sheet!A1:B2"],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/s1/values/My%20Sheet!A1:B2"
        );
    }
}
