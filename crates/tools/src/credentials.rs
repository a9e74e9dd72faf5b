//! Credential sources for workspace access.
//!
//! Only reading an existing bearer token is supported. Obtaining or
//! refreshing tokens happens outside this process.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use deskmate_core::error::ToolError;
use serde::Deserialize;
use tracing::debug;

const NOT_CONNECTED: &str = "Google account is not connected. Please sign in first.";

/// Supplies a bearer token for workspace requests.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short human-readable description for diagnostics.
    fn describe(&self) -> String;

    /// A currently valid access token, or `ToolError::AuthRequired`.
    async fn access_token(&self) -> Result<String, ToolError>;
}

/// A fixed token from config or the environment.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticToken {
    fn describe(&self) -> String {
        "static access token".into()
    }

    async fn access_token(&self) -> Result<String, ToolError> {
        if self.token.trim().is_empty() {
            return Err(ToolError::AuthRequired(NOT_CONNECTED.into()));
        }
        Ok(self.token.clone())
    }
}

/// A stored `token.json`, re-read on every request.
pub struct TokenFile {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct StoredToken {
    token: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        // Naive timestamps are written in UTC.
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[async_trait]
impl CredentialSource for TokenFile {
    fn describe(&self) -> String {
        format!("token file {}", self.path.display())
    }

    async fn access_token(&self) -> Result<String, ToolError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "Token file unreadable");
                return Err(ToolError::AuthRequired(NOT_CONNECTED.into()));
            }
        };

        let stored: StoredToken = serde_json::from_str(&content).map_err(|e| {
            ToolError::AuthRequired(format!("{NOT_CONNECTED} (token file is invalid: {e})"))
        })?;

        let token = stored
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ToolError::AuthRequired(NOT_CONNECTED.into()))?;

        if let Some(expiry) = stored.expiry.as_deref().and_then(Self::parse_expiry)
            && expiry <= Utc::now()
        {
            return Err(ToolError::AuthRequired(
                "Google authorization has expired. Please sign in again.".into(),
            ));
        }

        Ok(token)
    }
}

/// No credentials configured at all.
pub struct NoCredentials;

#[async_trait]
impl CredentialSource for NoCredentials {
    fn describe(&self) -> String {
        "none".into()
    }

    async fn access_token(&self) -> Result<String, ToolError> {
        Err(ToolError::AuthRequired(NOT_CONNECTED.into()))
    }
}

/// Pick a credential source from config: a direct token wins over a file.
pub fn from_config(config: &deskmate_config::GoogleConfig) -> Arc<dyn CredentialSource> {
    if let Some(token) = config.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Arc::new(StaticToken::new(token));
    }
    match &config.token_file {
        Some(path) => Arc::new(TokenFile::new(path.clone())),
        None => Arc::new(NoCredentials),
    }
}
