use chrono::{SecondsFormat, Utc};
use deskmate_core::error::ToolError;
use deskmate_core::tool::ToolName;
use reqwest::Method;
use serde_json::{Value, json};

use super::{GoogleWorkspace, required_text, text};
use crate::operation::{CalendarCreateEvent, CalendarDeleteEvent, CalendarListEvents, CalendarUpdateEvent};

const CALENDAR_ID: &str = "primary";

/// `dateTime` for timed events, `date` for all-day ones.
fn event_time(boundary: &Value) -> String {
    boundary["dateTime"]
        .as_str()
        .or_else(|| boundary["date"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn summarize_event(event: &Value) -> Value {
    let summary = event["summary"].as_str().unwrap_or("(No title)");
    json!({
        "id": text(event, "id"),
        "summary": summary,
        "start": event_time(&event["start"]),
        "end": event_time(&event["end"]),
        "location": text(event, "location"),
        "description": text(event, "description"),
        "link": text(event, "htmlLink"),
    })
}

impl GoogleWorkspace {
    fn timed(&self, at: &str) -> Value {
        json!({ "dateTime": at, "timeZone": self.time_zone })
    }

    pub(super) async fn calendar_list_events(&self, args: CalendarListEvents) -> Result<Value, ToolError> {
        let tool = ToolName::CalendarListEvents;
        let url = self.url(tool, &self.endpoints.calendar, &["calendars", CALENDAR_ID, "events"])?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let request = self.authed(Method::GET, url).await?.query(&[
            ("timeMin", now),
            ("maxResults", args.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ]);
        let response = self.send_json(tool, request).await?;

        let events: Vec<Value> = response["items"]
            .as_array()
            .into_iter()
            .flatten()
            .map(summarize_event)
            .collect();
        Ok(Value::Array(events))
    }

    pub(super) async fn calendar_create_event(&self, args: CalendarCreateEvent) -> Result<Value, ToolError> {
        let tool = ToolName::CalendarCreateEvent;
        let url = self.url(tool, &self.endpoints.calendar, &["calendars", CALENDAR_ID, "events"])?;

        let mut body = json!({
            "summary": args.summary,
            "description": args.description,
            "location": args.location,
            "start": self.timed(&args.start_time),
            "end": self.timed(&args.end_time),
        });
        if let Some(attendees) = args.attendees.filter(|a| !a.is_empty()) {
            body["attendees"] = attendees.iter().map(|email| json!({ "email": email })).collect();
        }

        let request = self.authed(Method::POST, url).await?.json(&body);
        let event = self.send_json(tool, request).await?;

        Ok(json!({
            "id": required_text(tool, &event, "id")?,
            "summary": event["summary"],
            "start": event["start"]["dateTime"],
            "end": event["end"]["dateTime"],
            "link": text(&event, "htmlLink"),
            "status": "created",
        }))
    }

    pub(super) async fn calendar_update_event(&self, args: CalendarUpdateEvent) -> Result<Value, ToolError> {
        let tool = ToolName::CalendarUpdateEvent;
        let url = self.url(
            tool,
            &self.endpoints.calendar,
            &["calendars", CALENDAR_ID, "events", &args.event_id],
        )?;

        let mut event = self
            .send_json(tool, self.authed(Method::GET, url.clone()).await?)
            .await?;
        if !event.is_object() {
            return Err(ToolError::failed(tool.as_str(), "event lookup returned no object"));
        }

        if let Some(summary) = args.summary.filter(|s| !s.is_empty()) {
            event["summary"] = json!(summary);
        }
        if let Some(start) = args.start_time.filter(|s| !s.is_empty()) {
            event["start"] = self.timed(&start);
        }
        if let Some(end) = args.end_time.filter(|s| !s.is_empty()) {
            event["end"] = self.timed(&end);
        }

        let request = self.authed(Method::PUT, url).await?.json(&event);
        let updated = self.send_json(tool, request).await?;

        Ok(json!({
            "id": required_text(tool, &updated, "id")?,
            "summary": updated["summary"],
            "status": "updated",
            "link": text(&updated, "htmlLink"),
        }))
    }

    pub(super) async fn calendar_delete_event(&self, args: CalendarDeleteEvent) -> Result<Value, ToolError> {
        let tool = ToolName::CalendarDeleteEvent;
        let url = self.url(
            tool,
            &self.endpoints.calendar,
            &["calendars", CALENDAR_ID, "events", &args.event_id],
        )?;
        self.send_json(tool, self.authed(Method::DELETE, url).await?).await?;

        Ok(json!({ "id": args.event_id, "status": "deleted" }))
    }
}
