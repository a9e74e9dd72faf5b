use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};
use std::collections::HashMap;

use super::{GoogleWorkspace, required_text, text};
use crate::operation::{Email, GmailGetMessage, GmailListMessages};

/// Gmail bodies arrive base64url encoded, with or without padding.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
        format!("=?utf-8?B?{encoded}?=")
    }
}

/// A single-part HTML MIME message, base64url encoded for the `raw` field.
fn raw_message(email: &Email) -> String {
    let mut mime = String::new();
    mime.push_str(&format!("To: {}\r\n", email.to));
    if !email.cc.is_empty() {
        mime.push_str(&format!("Cc: {}\r\n", email.cc));
    }
    if !email.bcc.is_empty() {
        mime.push_str(&format!("Bcc: {}\r\n", email.bcc));
    }
    mime.push_str(&format!("Subject: {}\r\n", encode_header(&email.subject)));
    mime.push_str("MIME-Version: 1.0\r\n");
    mime.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
    mime.push_str("Content-Transfer-Encoding: 8bit\r\n");
    mime.push_str("\r\n");
    mime.push_str(&email.body);
    URL_SAFE.encode(mime.as_bytes())
}

/// `From`, `Subject` and friends keyed by header name.
fn headers(message: &Value) -> HashMap<String, String> {
    message["payload"]["headers"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|h| Some((h["name"].as_str()?.to_string(), h["value"].as_str()?.to_string())))
        .collect()
}

fn decode_body(data: &str) -> String {
    BODY_ENGINE
        .decode(data)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// The first `text/plain` part, or the payload body for single-part mail.
fn message_body(message: &Value) -> String {
    let payload = &message["payload"];
    if let Some(parts) = payload["parts"].as_array() {
        return parts
            .iter()
            .find(|p| p["mimeType"] == "text/plain")
            .and_then(|p| p["body"]["data"].as_str())
            .map(decode_body)
            .unwrap_or_default();
    }
    payload["body"]["data"]
        .as_str()
        .map(decode_body)
        .unwrap_or_default()
}

/// Restrict searches to the inbox unless a location is given.
fn inbox_query(query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        "in:inbox".into()
    } else if query.contains("in:") {
        query.to_string()
    } else {
        format!("in:inbox {query}")
    }
}

fn header(headers: &HashMap<String, String>, name: &str) -> String {
    headers.get(name).cloned().unwrap_or_default()
}

impl GoogleWorkspace {
    pub(super) async fn gmail_send(&self, email: Email) -> Result<Value, ToolError> {
        let tool = ToolName::GmailSend;
        let url = self.url(tool, &self.endpoints.gmail, &["users", "me", "messages", "send"])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "raw": raw_message(&email) }));
        let sent = self.send_json(tool, request).await?;

        Ok(json!({
            "id": required_text(tool, &sent, "id")?,
            "threadId": text(&sent, "threadId"),
            "status": "sent",
        }))
    }

    pub(super) async fn gmail_create_draft(&self, email: Email) -> Result<Value, ToolError> {
        let tool = ToolName::GmailCreateDraft;
        let url = self.url(tool, &self.endpoints.gmail, &["users", "me", "drafts"])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "message": { "raw": raw_message(&email) } }));
        let draft = self.send_json(tool, request).await?;

        Ok(json!({
            "id": required_text(tool, &draft, "id")?,
            "messageId": text(&draft["message"], "id"),
            "status": "draft_created",
        }))
    }

    pub(super) async fn gmail_list_messages(&self, args: GmailListMessages) -> Result<Value, ToolError> {
        let tool = ToolName::GmailListMessages;
        let url = self.url(tool, &self.endpoints.gmail, &["users", "me", "messages"])?;
        let request = self.authed(Method::GET, url).await?.query(&[
            ("q", inbox_query(&args.query)),
            ("maxResults", args.max_results.to_string()),
        ]);
        let listing = self.send_json(tool, request).await?;

        let mut messages = Vec::new();
        for meta in listing["messages"].as_array().into_iter().flatten() {
            let id = required_text(tool, meta, "id")?;
            let url = self.url(tool, &self.endpoints.gmail, &["users", "me", "messages", &id])?;
            let request = self.authed(Method::GET, url).await?.query(&[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ]);
            let message = self.send_json(tool, request).await?;
            let headers = headers(&message);

            messages.push(json!({
                "id": text(&message, "id"),
                "threadId": text(&message, "threadId"),
                "subject": header(&headers, "Subject"),
                "from": header(&headers, "From"),
                "date": header(&headers, "Date"),
                "snippet": text(&message, "snippet"),
            }));
        }

        Ok(Value::Array(messages))
    }

    pub(super) async fn gmail_get_message(&self, args: GmailGetMessage) -> Result<Value, ToolError> {
        let tool = ToolName::GmailGetMessage;
        let url = self.url(
            tool,
            &self.endpoints.gmail,
            &["users", "me", "messages", &args.message_id],
        )?;
        let request = self.authed(Method::GET, url).await?.query(&[("format", "full")]);
        let message = self.send_json(tool, request).await?;
        let headers = headers(&message);

        Ok(json!({
            "id": text(&message, "id"),
            "subject": header(&headers, "Subject"),
            "from": header(&headers, "From"),
            "to": header(&headers, "To"),
            "date": header(&headers, "Date"),
            "body": message_body(&message),
            "snippet": text(&message, "snippet"),
        }))
    }
}
