use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::info;

use super::{GoogleWorkspace, required_text, text};
use crate::operation::{DriveCreateFolder, DriveDownloadFile, DriveListFiles, DriveSearchFiles};

const FILE_FIELDS: &str = "files(id, name, mimeType, modifiedTime, size, webViewLink)";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Google-native types and the Office format each is exported as.
const EXPORTS: [(&str, &str, &str); 3] = [
    (
        "application/vnd.google-apps.document",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    (
        "application/vnd.google-apps.spreadsheet",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    (
        "application/vnd.google-apps.presentation",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".pptx",
    ),
];

/// Quote a value for a Drive `q` expression.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Keep a remote file name from escaping the download directory.
fn local_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "download".into(),
        other => other.to_string(),
    }
}

impl GoogleWorkspace {
    async fn list_files(&self, tool: ToolName, query: Option<&str>, page_size: u32) -> Result<Value, ToolError> {
        let url = self.url(tool, &self.endpoints.drive, &["files"])?;
        let mut params = vec![
            ("pageSize", page_size.to_string()),
            ("fields", FILE_FIELDS.to_string()),
            ("orderBy", "modifiedTime desc".to_string()),
        ];
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }

        let request = self.authed(Method::GET, url).await?.query(&params);
        let response = self.send_json(tool, request).await?;
        Ok(response.get("files").cloned().unwrap_or_else(|| json!([])))
    }

    pub(super) async fn drive_list_files(&self, args: DriveListFiles) -> Result<Value, ToolError> {
        self.list_files(ToolName::DriveListFiles, args.query.as_deref(), args.page_size)
            .await
    }

    pub(super) async fn drive_search_files(&self, args: DriveSearchFiles) -> Result<Value, ToolError> {
        let query = format!("name contains '{}' and trashed = false", quote(&args.name));
        self.list_files(ToolName::DriveSearchFiles, Some(&query), 20).await
    }

    pub(super) async fn drive_download_file(&self, args: DriveDownloadFile) -> Result<Value, ToolError> {
        let tool = ToolName::DriveDownloadFile;

        let meta_url = self.url(tool, &self.endpoints.drive, &["files", &args.file_id])?;
        let request = self
            .authed(Method::GET, meta_url)
            .await?
            .query(&[("fields", "name, mimeType")]);
        let meta = self.send_json(tool, request).await?;

        let mut file_name = local_file_name(&text(&meta, "name"));
        let mime = text(&meta, "mimeType");

        let request = match EXPORTS.iter().find(|(native, _, _)| *native == mime) {
            Some((_, export_mime, ext)) => {
                if !file_name.ends_with(ext) {
                    file_name.push_str(ext);
                }
                let url = self.url(tool, &self.endpoints.drive, &["files", &args.file_id, "export"])?;
                self.authed(Method::GET, url)
                    .await?
                    .query(&[("mimeType", *export_mime)])
            }
            None => {
                let url = self.url(tool, &self.endpoints.drive, &["files", &args.file_id])?;
                self.authed(Method::GET, url).await?.query(&[("alt", "media")])
            }
        };
        let bytes = self.send_bytes(tool, request).await?;

        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|e| ToolError::failed(tool.as_str(), e))?;
        let path = self.download_dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ToolError::failed(tool.as_str(), e))?;

        info!(file = %file_name, bytes = bytes.len(), "Downloaded Drive file");
        Ok(json!({
            "status": "downloaded",
            "fileName": file_name,
            "path": path.display().to_string(),
            "size": bytes.len(),
            "message": format!("'{file_name}' was downloaded successfully. Give the user the download location."),
        }))
    }

    pub(super) async fn drive_create_folder(&self, args: DriveCreateFolder) -> Result<Value, ToolError> {
        let tool = ToolName::DriveCreateFolder;
        let url = self.url(tool, &self.endpoints.drive, &["files"])?;

        let mut metadata = json!({
            "name": args.name,
            "mimeType": FOLDER_MIME,
        });
        if let Some(parent) = args.parent_id.filter(|p| !p.is_empty()) {
            metadata["parents"] = json!([parent]);
        }

        let request = self
            .authed(Method::POST, url)
            .await?
            .query(&[("fields", "id, name, webViewLink")])
            .json(&metadata);
        let created = self.send_json(tool, request).await?;
        required_text(tool, &created, "id")?;
        Ok(created)
    }
}
