use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};

use super::{GoogleWorkspace, required_text, text};
use crate::operation::{SlidesAddSlide, SlidesAddText, SlidesCreate, SlidesGet};

fn edit_link(presentation_id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{presentation_id}/edit")
}

/// Object id for the text box placed on `slide_id`.
fn text_box_id(slide_id: &str) -> String {
    let prefix: String = slide_id.chars().take(8).collect();
    format!("textbox_{prefix}")
}

/// Slide ids with the text of each shape that carries text.
fn summarize_slides(presentation: &Value) -> Vec<Value> {
    presentation["slides"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|slide| {
            let elements: Vec<Value> = slide["pageElements"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|element| element["shape"]["text"]["textElements"].as_array())
                .map(|runs| {
                    let content: String = runs
                        .iter()
                        .filter_map(|r| r["textRun"]["content"].as_str())
                        .collect();
                    json!({"type": "text", "content": content.trim()})
                })
                .collect();
            json!({"objectId": text(slide, "objectId"), "elements": elements})
        })
        .collect()
}

impl GoogleWorkspace {
    async fn batch_update_presentation(
        &self,
        tool: ToolName,
        presentation_id: &str,
        requests: Value,
    ) -> Result<Value, ToolError> {
        let method = format!("{presentation_id}:batchUpdate");
        let url = self.url(tool, &self.endpoints.slides, &["presentations", &method])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "requests": requests }));
        self.send_json(tool, request).await
    }

    pub(super) async fn slides_create(&self, args: SlidesCreate) -> Result<Value, ToolError> {
        let tool = ToolName::SlidesCreate;
        let url = self.url(tool, &self.endpoints.slides, &["presentations"])?;
        let request = self
            .authed(Method::POST, url)
            .await?
            .json(&json!({ "title": args.title }));
        let created = self.send_json(tool, request).await?;
        let presentation_id = required_text(tool, &created, "presentationId")?;

        Ok(json!({
            "presentationId": presentation_id,
            "title": args.title,
            "link": edit_link(&presentation_id),
        }))
    }

    pub(super) async fn slides_get(&self, args: SlidesGet) -> Result<Value, ToolError> {
        let tool = ToolName::SlidesGet;
        let url = self.url(tool, &self.endpoints.slides, &["presentations", &args.presentation_id])?;
        let presentation = self.send_json(tool, self.authed(Method::GET, url).await?).await?;
        let slides = summarize_slides(&presentation);

        Ok(json!({
            "presentationId": args.presentation_id,
            "title": text(&presentation, "title"),
            "slideCount": slides.len(),
            "slides": slides,
            "link": edit_link(&args.presentation_id),
        }))
    }

    pub(super) async fn slides_add_slide(&self, args: SlidesAddSlide) -> Result<Value, ToolError> {
        let tool = ToolName::SlidesAddSlide;
        let response = self
            .batch_update_presentation(
                tool,
                &args.presentation_id,
                json!([{
                    "createSlide": {
                        "slideLayoutReference": { "predefinedLayout": args.layout }
                    }
                }]),
            )
            .await?;
        let slide_id = required_text(tool, &response["replies"][0]["createSlide"], "objectId")?;

        Ok(json!({
            "status": "success",
            "slideId": slide_id,
            "presentationId": args.presentation_id,
        }))
    }

    pub(super) async fn slides_add_text(&self, args: SlidesAddText) -> Result<Value, ToolError> {
        let element_id = text_box_id(&args.slide_id);
        self.batch_update_presentation(
            ToolName::SlidesAddText,
            &args.presentation_id,
            json!([
                {
                    "createShape": {
                        "objectId": element_id,
                        "shapeType": "TEXT_BOX",
                        "elementProperties": {
                            "pageObjectId": args.slide_id,
                            "size": {
                                "width": { "magnitude": 500, "unit": "PT" },
                                "height": { "magnitude": 300, "unit": "PT" }
                            },
                            "transform": {
                                "scaleX": 1,
                                "scaleY": 1,
                                "translateX": 100,
                                "translateY": 100,
                                "unit": "PT"
                            }
                        }
                    }
                },
                {
                    "insertText": {
                        "objectId": element_id,
                        "insertionIndex": 0,
                        "text": args.text
                    }
                }
            ]),
        )
        .await?;

        Ok(json!({
            "status": "success",
            "elementId": element_id,
            "presentationId": args.presentation_id,
        }))
    }
}
