//! Provider trait: the model client abstraction.
//!
//! A Provider sends an ordered message list to a completions endpoint and
//! returns the raw text of the first choice. Tool calls are not negotiated
//! at this layer; they arrive embedded in that text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// A completions request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "deepseek/deepseek-r1")
    pub model: String,

    /// The conversation messages, in order
    pub messages: Vec<Message>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

pub fn default_temperature() -> f32 {
    0.3
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Raw text of the first choice
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend serves it.
/// Absence or rejection of the bearer credential is a `ProviderError`, never
/// a tool failure.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults_when_deserialized() {
        let req: ProviderRequest = serde_json::from_str(
            r#"{"model":"m","messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn max_tokens_omitted_when_none() {
        let req = ProviderRequest {
            model: "m".into(),
            messages: vec![],
            temperature: default_temperature(),
            max_tokens: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"));
    }
}
