use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};

use super::{GoogleWorkspace, required_text, text};
use crate::operation::{DocsAppendText, DocsCreate, DocsFindReplace, DocsRead};

fn edit_link(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{document_id}/edit")
}

/// Concatenate every text run of the document body.
fn plain_text(document: &Value) -> String {
    let mut content = String::new();
    let elements = document["body"]["content"].as_array().into_iter().flatten();
    for element in elements {
        let runs = element["paragraph"]["elements"].as_array().into_iter().flatten();
        for run in runs {
            if let Some(text) = run["textRun"]["content"].as_str() {
                content.push_str(text);
            }
        }
    }
    content
}

impl GoogleWorkspace {
    async fn batch_update_document(
        &self,
        tool: ToolName,
        document_id: &str,
        requests: Value,
    ) -> Result<Value, ToolError> {
        let method = format!("{document_id}:batchUpdate");
        let url = self.url(tool, &self.endpoints.docs, &["documents", &method])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "requests": requests }));
        self.send_json(tool, request).await
    }

    async fn insert_text_at_end(&self, tool: ToolName, document_id: &str, text: &str) -> Result<(), ToolError> {
        self.batch_update_document(
            tool,
            document_id,
            json!([{
                "insertText": {
                    "endOfSegmentLocation": {},
                    "text": text,
                }
            }]),
        )
        .await?;
        Ok(())
    }

    pub(super) async fn docs_create(&self, args: DocsCreate) -> Result<Value, ToolError> {
        let tool = ToolName::DocsCreate;
        let url = self.url(tool, &self.endpoints.docs, &["documents"])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "title": args.title }));
        let created = self.send_json(tool, request).await?;
        let document_id = required_text(tool, &created, "documentId")?;

        if let Some(body) = args.body_text.filter(|b| !b.is_empty()) {
            self.insert_text_at_end(tool, &document_id, &body).await?;
        }

        Ok(json!({
            "documentId": document_id,
            "title": args.title,
            "link": edit_link(&document_id),
        }))
    }

    pub(super) async fn docs_read(&self, args: DocsRead) -> Result<Value, ToolError> {
        let tool = ToolName::DocsRead;
        let url = self.url(tool, &self.endpoints.docs, &["documents", &args.document_id])?;
        let document = self.send_json(tool, self.authed(Method::GET, url).await?).await?;

        Ok(json!({
            "documentId": args.document_id,
            "title": text(&document, "title"),
            "content": plain_text(&document),
            "link": edit_link(&args.document_id),
        }))
    }

    pub(super) async fn docs_append_text(&self, args: DocsAppendText) -> Result<Value, ToolError> {
        self.insert_text_at_end(ToolName::DocsAppendText, &args.document_id, &args.text)
            .await?;
        Ok(json!({
            "status": "success",
            "documentId": args.document_id,
        }))
    }

    pub(super) async fn docs_find_replace(&self, args: DocsFindReplace) -> Result<Value, ToolError> {
        let response = self
            .batch_update_document(
                ToolName::DocsFindReplace,
                &args.document_id,
                json!([{
                    "replaceAllText": {
                        "containsText": { "text": args.find, "matchCase": true },
                        "replaceText": args.replace,
                    }
                }]),
            )
            .await?;

        let occurrences = response["replies"][0]["replaceAllText"]["occurrencesChanged"]
            .as_u64()
            .unwrap_or(0);
        Ok(json!({
            "status": "success",
            "documentId": args.document_id,
            "occurrencesChanged": occurrences,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::workspace_for;
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn plain_text_joins_runs_across_paragraphs() {
        let document = json!({
            "body": {"content": [
                {"sectionBreak": {}},
                {"paragraph": {"elements": [
                    {"textRun": {"content": "Hello "}},
                    {"textRun": {"content": "world\n"}}
                ]}},
                {"paragraph": {"elements": [{"textRun": {"content": "Bye\n"}}]}}
            ]}
        });
        assert_eq!(plain_text(&document), "Hello world\nBye\n");
    }

    #[tokio::test]
    async fn create_with_body_inserts_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/docs/v1/documents"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documentId": "doc9"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/docs/v1/documents/doc9:batchUpdate"))
            .and(body_partial_json(json!({
                "requests": [{"insertText": {"text": "First line"}}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"replies": [{}]})))
            .expect(1)
            .mount(&server)
            .await;

        let result = workspace_for(&server)
            .docs_create(DocsCreate {
                title: "Plan".into(),
                body_text: Some("First line".into()),
            })
            .await
            .unwrap();
        assert_eq!(result["documentId"], "doc9");
        assert_eq!(result["link"], "https://docs.google.com/document/d/doc9/edit");
    }

    #[tokio::test]
    async fn find_replace_reports_occurrences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/docs/v1/documents/d1:batchUpdate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "replies": [{"replaceAllText": {"occurrencesChanged": 3}}]
            })))
            .mount(&server)
            .await;

        let result = workspace_for(&server)
            .docs_find_replace(DocsFindReplace {
                document_id: "d1".into(),
                find: "old".into(),
                replace: "new".into(),
            })
            .await
            .unwrap();
        assert_eq!(result["occurrencesChanged"], 3);
    }
}
