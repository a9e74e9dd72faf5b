//! OpenAI-compatible provider implementation.
//!
//! Works with OpenRouter, OpenAI, and any endpoint that exposes
//! `/chat/completions`. Non-streaming only: the agent loop needs the whole
//! text before it can look for tool directives.

use async_trait::async_trait;
use deskmate_core::error::ProviderError;
use deskmate_core::message::Message;
use deskmate_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible chat completions client.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// A missing key is accepted here and reported on the first request.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        })
    }

    /// Create an OpenRouter provider (convenience constructor).
    pub fn openrouter(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(
            "openrouter",
            "https://openrouter.ai/api/v1",
            Some(api_key.into()),
            Duration::from_secs(120),
        )
    }

    /// Build the provider described by the application config.
    pub fn from_config(config: &deskmate_config::AppConfig) -> Result<Self, ProviderError> {
        let name = if config.base_url.contains("openrouter.ai") {
            "openrouter"
        } else {
            "openai_compat"
        };
        Self::new(
            name,
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: Some(m.content.clone()),
            })
            .collect()
    }

    fn map_send_error(e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!("no API key set for {}", self.name))
        })?;

        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(provider = %self.name, model = %request.model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model.unwrap_or(request.model),
            usage,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(false);
        };

        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "test/model".into(),
            messages: vec![Message::system("You are helpful"), Message::user("Hello")],
            temperature: 0.3,
            max_tokens: Some(4096),
        }
    }

    fn provider_for(server: &MockServer, key: Option<&str>) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(
            "test",
            server.uri(),
            key.map(String::from),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn openrouter_constructor() {
        let provider = OpenAiCompatProvider::openrouter("sk-test").unwrap();
        assert_eq!(provider.name(), "openrouter");
        assert!(provider.base_url().contains("openrouter.ai"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider =
            OpenAiCompatProvider::new("x", "http://localhost:1234/v1/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.base_url(), "http://localhost:1234/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[tokio::test]
    async fn complete_returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "test/model", "max_tokens": 4096})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "test/model",
                "choices": [
                    {"message": {"role": "assistant", "content": "Hi there"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ],
                "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider_for(&server, Some("sk-test"))
            .complete(request())
            .await
            .unwrap();
        assert_eq!(response.content, "Hi there");
        assert_eq!(response.usage.unwrap().total_tokens, 12);
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let server = MockServer::start().await;
        let err = provider_for(&server, None).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("bad")).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 17 }));
    }

    #[tokio::test]
    async fn server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).complete(request()).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server, Some("k")).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn null_content_becomes_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let response = provider_for(&server, Some("k")).complete(request()).await.unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.model, "test/model");
    }
}
