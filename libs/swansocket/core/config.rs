use crate::heartbeat::DEFAULT_PING_INTERVAL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Query parameters every connection URL starts with
pub const FIXED_PARAMS: [(&str, &str); 2] = [("EIO", "3"), ("transport", "websocket")];

/// Overrides the configured URL
pub const URL_ENV_VAR: &str = "SWAN_SOCKET_URL";

/// Overrides the configured keepalive interval (milliseconds)
pub const PING_INTERVAL_ENV_VAR: &str = "SWAN_SOCKET_PING_INTERVAL_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid environment variable {name}: {value}")]
    InvalidEnvVar { name: String, value: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Session configuration as stored on disk
///
/// ```yaml
/// url: wss://game.example.com/socket.io/
/// params:
///   token: abc123
/// ping_interval_ms: 2000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub url: String,

    /// Extra query parameters, merged after the fixed ones
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
}

fn default_ping_interval_ms() -> u64 {
    DEFAULT_PING_INTERVAL.as_millis() as u64
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: BTreeMap::new(),
            ping_interval_ms: default_ping_interval_ms(),
        }
    }

    /// Load from a YAML file, then apply `.env` / environment overrides
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: SessionConfig = serde_yaml::from_str(&yaml_content)?;

        dotenv::dotenv().ok(); // Don't fail if .env doesn't exist
        config.apply_env_overrides()?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            info!("Overriding session URL from environment variable");
            self.url = url;
        }

        if let Ok(value) = std::env::var(PING_INTERVAL_ENV_VAR) {
            self.ping_interval_ms = value.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: PING_INTERVAL_ENV_VAR.to_string(),
                value: value.clone(),
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(ConfigError::ValidationError(format!(
                "url must use ws:// or wss://, got '{}'",
                self.url
            )));
        }

        if self.ping_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "ping_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// Final connection URL with the fixed and extra query parameters
    pub fn connection_url(&self) -> String {
        let params: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        build_url(&self.url, &params)
    }

    pub fn log(&self) {
        info!("Session configuration:");
        info!("  URL: {}", self.url);
        info!("  Extra params: {}", self.params.len());
        info!("  Ping interval: {}ms", self.ping_interval_ms);
    }
}

/// Append the query parameters to `url`
///
/// The fixed parameters come first; a caller parameter with the same key
/// replaces the value in place, new keys are appended in order. Uses `&`
/// when `url` already carries a query string. Values are written verbatim.
pub fn build_url(url: &str, params: &[(String, String)]) -> String {
    let mut merged: Vec<(String, String)> = FIXED_PARAMS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    for (key, value) in params {
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    let query: Vec<String> = merged.iter().map(|(k, v)| format!("{}={}", k, v)).collect();

    format!("{}{}{}", url, separator, query.join("&"))
}
