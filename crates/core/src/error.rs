//! Error types for the Deskmate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Deskmate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model client errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Conversation store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the model completions call. Any of these aborts the turn.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Failures inside the operation registry. These never cross the registry
/// boundary as errors; they are folded into an error-tagged `ToolResult`.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Authorization required: {0}")]
    AuthRequired(String),

    #[error("Tool {tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}

impl ToolError {
    /// Shorthand for an execution failure of a named tool.
    pub fn failed(tool_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}
