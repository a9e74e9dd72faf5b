//! Shared stubs for agent tests.

use async_trait::async_trait;
use deskmate_core::error::{ProviderError, ToolError};
use deskmate_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use deskmate_core::tool::ToolName;
use deskmate_tools::{Operation, OperationRegistry, Workspace};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Returns scripted replies in order and records every request.
///
/// Panics if called more times than it has replies.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply left for call #{}", self.call_count()));
        reply.map(|content| ProviderResponse {
            content,
            model: "scripted-model".into(),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// Answers every request with the same tool call.
pub struct AlwaysToolCall {
    calls: Mutex<usize>,
}

impl AlwaysToolCall {
    pub fn new() -> Self {
        Self { calls: Mutex::new(0) }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for AlwaysToolCall {
    fn name(&self) -> &str {
        "always_tool_call"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Ok(ProviderResponse {
            content: "```json\n{\"tool\": \"drive_list_files\", \"args\": {}}\n```".into(),
            model: "loop-model".into(),
            usage: None,
        })
    }
}

/// Records the name of every operation it runs.
pub struct RecordingWorkspace {
    pub authorized: bool,
    pub fail_on: Option<ToolName>,
    seen: Mutex<Vec<ToolName>>,
}

impl RecordingWorkspace {
    pub fn new() -> Self {
        Self {
            authorized: true,
            fail_on: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(tool: ToolName) -> Self {
        Self {
            fail_on: Some(tool),
            ..Self::new()
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            authorized: false,
            ..Self::new()
        }
    }

    pub fn seen(&self) -> Vec<ToolName> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Workspace for RecordingWorkspace {
    fn name(&self) -> &str {
        "recording"
    }

    async fn is_authorized(&self) -> bool {
        self.authorized
    }

    async fn execute(&self, operation: Operation) -> Result<Value, ToolError> {
        let name = operation.name();
        self.seen.lock().unwrap().push(name);
        if self.fail_on == Some(name) {
            return Err(ToolError::failed(name.as_str(), "backend unavailable"));
        }
        Ok(json!({ "tool": name.as_str(), "status": "done" }))
    }
}

pub fn registry_over(workspace: Arc<RecordingWorkspace>) -> Arc<OperationRegistry> {
    Arc::new(OperationRegistry::new(workspace).unwrap())
}
