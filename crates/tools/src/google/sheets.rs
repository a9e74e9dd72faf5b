use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};

use super::{GoogleWorkspace, required_text};
use crate::operation::{SheetsAppendRows, SheetsCreate, SheetsRead, SheetsWrite};

fn edit_link(spreadsheet_id: &str) -> String {
    format!("https://docs.google.com/spreadsheets/d/{spreadsheet_id}/edit")
}

impl GoogleWorkspace {
    async fn write_values(
        &self,
        tool: ToolName,
        spreadsheet_id: &str,
        range: &str,
        values: Value,
    ) -> Result<Value, ToolError> {
        let url = self.url(
            tool,
            &self.endpoints.sheets,
            &["spreadsheets", spreadsheet_id, "values", range],
        )?;
        let request = self
            .authed(Method::PUT, url)
            .await?
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": values }));
        self.send_json(tool, request).await
    }

    pub(super) async fn sheets_create(&self, args: SheetsCreate) -> Result<Value, ToolError> {
        let tool = ToolName::SheetsCreate;
        let url = self.url(tool, &self.endpoints.sheets, &["spreadsheets"])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .query(&[("fields", "spreadsheetId")])
            .json(&json!({ "properties": { "title": args.title } }));
        let created = self.send_json(tool, request).await?;
        let spreadsheet_id = required_text(tool, &created, "spreadsheetId")?;

        if let Some(headers) = args.headers.filter(|h| !h.is_empty()) {
            self.write_values(tool, &spreadsheet_id, "A1", json!([headers]))
                .await?;
        }

        Ok(json!({
            "spreadsheetId": spreadsheet_id,
            "title": args.title,
            "link": edit_link(&spreadsheet_id),
        }))
    }

    pub(super) async fn sheets_read(&self, args: SheetsRead) -> Result<Value, ToolError> {
        let tool = ToolName::SheetsRead;
        let url = self.url(
            tool,
            &self.endpoints.sheets,
            &["spreadsheets", &args.spreadsheet_id, "values", &args.range_name],
        )?;
        let result = self.send_json(tool, self.authed(Method::GET, url).await?).await?;

        Ok(json!({
            "spreadsheetId": args.spreadsheet_id,
            "range": result.get("range").cloned().unwrap_or_else(|| json!(args.range_name)),
            "values": result.get("values").cloned().unwrap_or_else(|| json!([])),
        }))
    }

    pub(super) async fn sheets_write(&self, args: SheetsWrite) -> Result<Value, ToolError> {
        let result = self
            .write_values(
                ToolName::SheetsWrite,
                &args.spreadsheet_id,
                &args.range_name,
                json!(args.values),
            )
            .await?;

        Ok(json!({
            "status": "success",
            "updatedCells": result["updatedCells"].as_u64().unwrap_or(0),
            "spreadsheetId": args.spreadsheet_id,
        }))
    }

    pub(super) async fn sheets_append_rows(&self, args: SheetsAppendRows) -> Result<Value, ToolError> {
        let tool = ToolName::SheetsAppendRows;
        let url = self.url(
            tool,
            &self.endpoints.sheets,
            &["spreadsheets", &args.spreadsheet_id, "values", "A1:append"],
        )?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": args.values }));
        let result = self.send_json(tool, request).await?;

        Ok(json!({
            "status": "success",
            "updates": result.get("updates").cloned().unwrap_or_else(|| json!({})),
            "spreadsheetId": args.spreadsheet_id,
        }))
    }
}
