//! Operation registry: name lookup, argument coercion and dispatch.
//!
//! `dispatch` never fails: every error path is folded into
//! `ToolResult::Error` so one bad call cannot abort a turn.

use std::collections::BTreeSet;
use std::sync::Arc;

use deskmate_core::error::{Error, ToolError};
use deskmate_core::tool::{ParamKind, ToolCall, ToolName, ToolResult, ToolSpec};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::catalog::{catalog, spec};
use crate::operation::Operation;
use crate::workspace::Workspace;

/// Dispatches tool calls to a workspace through the typed operation set.
pub struct OperationRegistry {
    workspace: Arc<dyn Workspace>,
}

impl OperationRegistry {
    /// Build a registry over `workspace`, checking the catalog first.
    pub fn new(workspace: Arc<dyn Workspace>) -> Result<Self, Error> {
        validate_catalog()?;
        info!(workspace = workspace.name(), tools = catalog().len(), "Operation registry ready");
        Ok(Self { workspace })
    }

    pub fn catalog(&self) -> &'static [ToolSpec] {
        catalog()
    }

    pub fn workspace(&self) -> &Arc<dyn Workspace> {
        &self.workspace
    }

    pub async fn is_authorized(&self) -> bool {
        self.workspace.is_authorized().await
    }

    /// Execute one call. Side effects are not retried or deduplicated.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let result = self.try_dispatch(call).await;
        match &result {
            Ok(_) => debug!(tool = %call.tool, "Tool call succeeded"),
            Err(e) => warn!(tool = %call.tool, error = %e, "Tool call failed"),
        }
        result.into()
    }

    async fn try_dispatch(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let name: ToolName = call.tool.parse()?;
        let spec = spec(name).ok_or_else(|| ToolError::NotFound(call.tool.clone()))?;

        let args = coerce_args(spec, call.args.clone());
        check_required(spec, &args)?;

        let operation = Operation::parse(name, args)?;
        self.workspace.execute(operation).await
    }
}

/// Decode structured parameters that arrived as JSON text.
///
/// Values that are already native, or strings that do not decode, pass
/// through unchanged.
pub fn coerce_args(spec: &ToolSpec, mut args: Map<String, Value>) -> Map<String, Value> {
    for param in spec.params.iter().filter(|p| p.kind.is_structured()) {
        let Some(Value::String(text)) = args.get(param.name) else {
            continue;
        };
        if let Ok(decoded) = serde_json::from_str::<Value>(text.trim()) {
            debug!(tool = %spec.name, param = param.name, "Decoded JSON-encoded argument");
            args.insert(param.name.to_string(), decoded);
        }
    }
    args
}

fn check_required(spec: &ToolSpec, args: &Map<String, Value>) -> Result<(), ToolError> {
    for param in spec.required_params() {
        if args.get(param.name).is_none_or(Value::is_null) {
            return Err(ToolError::MissingArgument {
                tool: spec.name.to_string(),
                argument: param.name.to_string(),
            });
        }
    }
    Ok(())
}

fn sample_value(kind: ParamKind) -> Value {
    match kind {
        ParamKind::String => json!("sample"),
        ParamKind::Integer => json!(1),
        ParamKind::StringList => json!(["sample"]),
        ParamKind::Rows => json!([["sample"]]),
    }
}

/// Check that the catalog and the typed operations agree.
///
/// For every tool a sample argument map is built from the advertised
/// parameters, decoded into its typed struct, and re-encoded; the key sets
/// must match exactly.
pub fn validate_catalog() -> Result<(), Error> {
    let entries = catalog();
    let names: Vec<ToolName> = entries.iter().map(|s| s.name).collect();
    if names != ToolName::ALL {
        return Err(Error::Internal(
            "tool catalog does not list every tool exactly once in order".into(),
        ));
    }

    for spec in entries {
        let sample: Map<String, Value> = spec
            .params
            .iter()
            .map(|p| (p.name.to_string(), sample_value(p.kind)))
            .collect();

        let operation = Operation::parse(spec.name, sample).map_err(|e| {
            Error::Internal(format!("catalog entry {} does not decode: {e}", spec.name))
        })?;
        let encoded = operation.args_value()?;

        let advertised: BTreeSet<&str> = spec.params.iter().map(|p| p.name).collect();
        let implemented: BTreeSet<&str> = encoded
            .as_object()
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();

        if advertised != implemented {
            return Err(Error::Internal(format!(
                "catalog entry {} advertises {:?} but the operation takes {:?}",
                spec.name, advertised, implemented
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every operation it receives.
    #[derive(Default)]
    struct RecordingWorkspace {
        seen: Mutex<Vec<Operation>>,
        fail_with: Option<ToolError>,
    }

    #[async_trait]
    impl Workspace for RecordingWorkspace {
        fn name(&self) -> &str {
            "recording"
        }

        async fn is_authorized(&self) -> bool {
            true
        }

        async fn execute(&self, operation: Operation) -> Result<Value, ToolError> {
            let name = operation.name();
            self.seen.lock().unwrap().push(operation);
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(json!({"tool": name.as_str()})),
            }
        }
    }

    fn registry() -> (OperationRegistry, Arc<RecordingWorkspace>) {
        let workspace = Arc::new(RecordingWorkspace::default());
        let registry = OperationRegistry::new(workspace.clone()).unwrap();
        (registry, workspace)
    }

    fn call(tool: &str, args: Value) -> ToolCall {
        match args {
            Value::Object(map) => ToolCall::new(tool, map),
            _ => panic!("args must be an object"),
        }
    }

    #[test]
    fn catalog_matches_operations() {
        validate_catalog().unwrap();
    }

    #[tokio::test]
    async fn unknown_tool_is_error_result() {
        let (registry, workspace) = registry();
        let result = registry.dispatch(&call("nonexistent_tool", json!({}))).await;

        match result {
            ToolResult::Error(message) => assert!(message.contains("nonexistent_tool")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(workspace.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_required_argument_names_it() {
        let (registry, workspace) = registry();
        let result = registry.dispatch(&call("docs_create", json!({}))).await;

        match result {
            ToolResult::Error(message) => assert!(message.contains("'title'")),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(workspace.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_counts_as_missing() {
        let (registry, _) = registry();
        let result = registry
            .dispatch(&call("docs_read", json!({"document_id": null})))
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn known_tool_reaches_workspace() {
        let (registry, workspace) = registry();
        let result = registry
            .dispatch(&call("slides_add_slide", json!({"presentation_id": "p1"})))
            .await;

        assert_eq!(result, ToolResult::Ok(json!({"tool": "slides_add_slide"})));
        let seen = workspace.seen.lock().unwrap();
        let Operation::SlidesAddSlide(args) = &seen[0] else { panic!("wrong variant") };
        assert_eq!(args.layout, "BLANK");
    }

    #[tokio::test]
    async fn stringly_typed_rows_are_decoded() {
        let (registry, workspace) = registry();
        let result = registry
            .dispatch(&call(
                "sheets_write",
                json!({"spreadsheet_id": "s1", "range_name": "A1", "values": "[[\"a\", 1]]"}),
            ))
            .await;

        assert!(result.is_ok());
        let seen = workspace.seen.lock().unwrap();
        let Operation::SheetsWrite(args) = &seen[0] else { panic!("wrong variant") };
        assert_eq!(args.values, vec![vec![json!("a"), json!(1)]]);
    }

    #[tokio::test]
    async fn stringly_typed_integer_is_decoded() {
        let (registry, workspace) = registry();
        registry
            .dispatch(&call("calendar_list_events", json!({"max_results": "3"})))
            .await;

        let seen = workspace.seen.lock().unwrap();
        let Operation::CalendarListEvents(args) = &seen[0] else { panic!("wrong variant") };
        assert_eq!(args.max_results, 3);
    }

    #[test]
    fn native_values_pass_through_coercion() {
        let spec = spec(ToolName::SheetsCreate).unwrap();
        let args = call("sheets_create", json!({"title": "[1]", "headers": ["a", "b"]})).args;
        let coerced = coerce_args(spec, args.clone());
        assert_eq!(coerced, args);
    }

    #[test]
    fn undecodable_string_is_left_alone() {
        let spec = spec(ToolName::CalendarCreateEvent).unwrap();
        let args = call("calendar_create_event", json!({"attendees": "a@b.com"})).args;
        let coerced = coerce_args(spec, args);
        assert_eq!(coerced["attendees"], json!("a@b.com"));
    }

    #[tokio::test]
    async fn workspace_failure_becomes_error_result() {
        let workspace = Arc::new(RecordingWorkspace {
            fail_with: Some(ToolError::AuthRequired("not connected".into())),
            ..Default::default()
        });
        let registry = OperationRegistry::new(workspace).unwrap();

        let result = registry
            .dispatch(&call("gmail_get_message", json!({"message_id": "m1"})))
            .await;
        match result {
            ToolResult::Error(message) => assert!(message.contains("not connected")),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
