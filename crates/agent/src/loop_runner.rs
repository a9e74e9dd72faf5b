//! The agent turn loop.

use std::sync::Arc;

use chrono::Local;
use deskmate_config::AppConfig;
use deskmate_core::message::{ConversationHistory, ConversationId, MAX_HISTORY, Message};
use deskmate_core::provider::{Provider, ProviderRequest};
use deskmate_core::tool::ToolResult;
use deskmate_tools::OperationRegistry;
use tracing::{debug, error, info, trace, warn};

use crate::extractor::extract_tool_calls;
use crate::prompt::build_system_prompt;
use crate::sanitizer::sanitize;

/// Stored as the reply when the iteration cap is hit.
pub const FALLBACK_REPLY: &str = "Operation completed.";

/// Stored as the reply when the model call fails.
pub const TRANSPORT_ERROR_REPLY: &str =
    "Sorry, I couldn't reach the language model right now. Please try again in a moment.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The model answered without requesting tools.
    Completed,
    /// Every iteration requested tools; the fallback reply was used.
    IterationLimit,
    /// The model call failed; the transport error reply was used.
    TransportError,
}

/// Result of one turn. Always well-formed, whatever went wrong inside.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub history: ConversationHistory,
    /// Model calls made during the turn
    pub iterations: u32,
    pub status: TurnStatus,
}

/// Drives one user message through the model/tool cycle.
pub struct AgentLoop {
    /// The Model Client
    provider: Arc<dyn Provider>,

    /// Dispatcher for extracted tool calls
    registry: Arc<OperationRegistry>,

    model: String,
    temperature: f32,
    max_tokens: Option<u32>,

    /// Maximum model calls per turn
    max_iterations: u32,

    /// Cap on stored history entries
    history_limit: usize,

    assistant_name: String,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        registry: Arc<OperationRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            registry,
            model: model.into(),
            temperature: 0.3,
            max_tokens: Some(4096),
            max_iterations: 5,
            history_limit: MAX_HISTORY,
            assistant_name: "Deskmate".into(),
        }
    }

    /// Build from loaded configuration.
    pub fn from_config(
        provider: Arc<dyn Provider>,
        registry: Arc<OperationRegistry>,
        config: &AppConfig,
    ) -> Self {
        Self::new(provider, registry, config.model.clone())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens)
            .with_max_iterations(config.agent.max_iterations)
            .with_history_limit(config.agent.history_limit)
            .with_assistant_name(config.agent.assistant_name.clone())
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of model calls per turn (at least one).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Never above `MAX_HISTORY`.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.min(MAX_HISTORY);
        self
    }

    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Run one turn.
    ///
    /// Intermediate model output and tool results live only in this call.
    /// The returned history gains exactly the user message and the final
    /// reply, trimmed to the history limit.
    pub async fn turn(
        &self,
        session: &ConversationId,
        user_message: &str,
        mut history: ConversationHistory,
    ) -> TurnOutcome {
        history.trim(self.history_limit);
        info!(
            session_id = %session,
            history = history.len(),
            "Processing turn"
        );

        let system_prompt =
            build_system_prompt(&self.assistant_name, self.registry.catalog(), Local::now().naive_local());
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.messages().iter().cloned());
        messages.push(Message::user(user_message));

        for iteration in 1..=self.max_iterations {
            debug!(session_id = %session, iteration, "Agent loop iteration");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            };

            let response = match self.provider.complete(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        session_id = %session,
                        iteration,
                        provider = self.provider.name(),
                        error = %e,
                        "Model call failed, aborting turn"
                    );
                    return self.finish(
                        history,
                        user_message,
                        TRANSPORT_ERROR_REPLY.into(),
                        iteration,
                        TurnStatus::TransportError,
                    );
                }
            };

            if let Some(usage) = &response.usage {
                debug!(model = %response.model, tokens = usage.total_tokens, "Model responded");
            }
            trace!(content = %response.content, "Raw model output");

            let calls = extract_tool_calls(&response.content);
            if calls.is_empty() {
                let reply = sanitize(&response.content);
                return self.finish(history, user_message, reply, iteration, TurnStatus::Completed);
            }

            debug!(session_id = %session, iteration, calls = calls.len(), "Dispatching tool calls");
            messages.push(Message::assistant(response.content));

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = self.registry.dispatch(call).await;
                results.push((call.tool.as_str(), result));
            }
            messages.push(Message::user(render_tool_results(&results)));
        }

        warn!(
            session_id = %session,
            iterations = self.max_iterations,
            "Max tool iterations reached, using fallback reply"
        );
        self.finish(
            history,
            user_message,
            FALLBACK_REPLY.into(),
            self.max_iterations,
            TurnStatus::IterationLimit,
        )
    }

    fn finish(
        &self,
        mut history: ConversationHistory,
        user_message: &str,
        reply: String,
        iterations: u32,
        status: TurnStatus,
    ) -> TurnOutcome {
        history.push_turn(user_message, reply.clone(), self.history_limit);
        TurnOutcome {
            reply,
            history,
            iterations,
            status,
        }
    }
}

/// The synthetic message that feeds tool results back to the model.
pub fn render_tool_results(results: &[(&str, ToolResult)]) -> String {
    let rendered: Vec<String> = results
        .iter()
        .map(|(tool, result)| {
            let body = serde_json::to_string_pretty(result).unwrap_or_else(|e| {
                serde_json::json!({ "error": format!("unserializable result: {e}") }).to_string()
            });
            format!("Tool `{tool}` result:\n```json\n{body}\n```")
        })
        .collect();

    format!(
        "Tool call results:\n\n{}\n\nUse these results to give the user a clear answer.",
        rendered.join("\n\n")
    )
}
