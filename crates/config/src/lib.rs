//! Configuration loading, validation, and management for Deskmate.
//!
//! Loads configuration from `~/.deskmate/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use deskmate_core::message::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.deskmate/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the completions endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completions API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Transport timeout for one completions call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Turn loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// HTTP/WebSocket transport settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Google workspace access
    #[serde(default)]
    pub google: GoogleConfig,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "deepseek/deepseek-r1".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout() -> u64 {
    120
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .field("google", &self.google)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model calls allowed per turn before the fallback reply
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Stored history entries kept per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Name the assistant introduces itself with
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_history_limit() -> usize {
    MAX_HISTORY
}
fn default_assistant_name() -> String {
    "Deskmate".into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            assistant_name: default_assistant_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// A ready-to-use OAuth access token (takes precedence over `token_file`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Path to a stored `token.json` with `token` and optional `expiry`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// Where `drive_download_file` writes downloaded files
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Time zone attached to calendar event times
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_download_dir() -> PathBuf {
    AppConfig::config_dir().join("downloads")
}
fn default_time_zone() -> String {
    "Europe/Istanbul".into()
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            token_file: None,
            download_dir: default_download_dir(),
            time_zone: default_time_zone(),
        }
    }
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("access_token", &redact(&self.access_token))
            .field("token_file", &self.token_file)
            .field("download_dir", &self.download_dir)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.deskmate/config.toml),
    /// then apply environment overrides.
    ///
    /// API key lookup order when the file has none:
    /// - `DESKMATE_API_KEY`
    /// - `AI_API_KEY`
    /// - `OPENROUTER_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("DESKMATE_API_KEY")
                .or_else(|| lookup("AI_API_KEY"))
                .or_else(|| lookup("OPENROUTER_API_KEY"));
        }
        if let Some(base_url) = lookup("AI_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(model) = lookup("AI_MODEL") {
            self.model = model;
        }
        if let Some(token) = lookup("GOOGLE_ACCESS_TOKEN") {
            self.google.access_token = Some(token);
        }
        if let Some(host) = lookup("APP_HOST") {
            self.gateway.host = host;
        }
        match lookup("APP_PORT").map(|p| p.parse::<u16>()) {
            Some(Ok(port)) => self.gateway.port = port,
            Some(Err(e)) => tracing::warn!("Ignoring invalid APP_PORT: {e}"),
            None => {}
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".deskmate")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        // Turns are stored as user/assistant pairs.
        if self.agent.history_limit < 2 || self.agent.history_limit % 2 != 0 {
            return Err(ConfigError::ValidationError(
                "agent.history_limit must be an even number >= 2".into(),
            ));
        }

        if self.agent.history_limit > MAX_HISTORY {
            return Err(ConfigError::ValidationError(format!(
                "agent.history_limit must be at most {MAX_HISTORY}"
            )));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.history_limit, 30);
        assert_eq!(config.gateway.port, 8000);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn odd_history_limit_rejected() {
        let mut config = AppConfig::default();
        config.agent.history_limit = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn history_limit_above_cap_rejected() {
        let mut config = AppConfig::default();
        config.agent.history_limit = 100;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at most 30"));

        config.agent.history_limit = MAX_HISTORY;
        assert!(config.validate().is_ok());
        config.agent.history_limit = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "openai/gpt-4o-mini"

[agent]
max_iterations = 3
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.history_limit, 30);
        assert_eq!(config.max_tokens, 4096);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = [unterminated").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply_in_priority_order() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AI_API_KEY", "sk-ai"),
            ("OPENROUTER_API_KEY", "sk-or"),
            ("AI_MODEL", "some/model"),
            ("GOOGLE_ACCESS_TOKEN", "ya29.token"),
            ("APP_PORT", "9100"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-ai"));
        assert_eq!(config.model, "some/model");
        assert_eq!(config.google.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.gateway.port, 9100);
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config.apply_env_overrides(|k| (k == "AI_API_KEY").then(|| "from-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn invalid_port_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| (k == "APP_PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.google.access_token = Some("ya29.secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
