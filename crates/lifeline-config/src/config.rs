//! Configuration management for the client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default backend REST base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Default chat socket endpoint.
pub const DEFAULT_CHAT_SOCKET_URL: &str = "ws://localhost:8000/ws/chat";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default time to wait for a terminal response before giving up on a turn.
pub const DEFAULT_THINKING_TIMEOUT_SECS: u64 = 120;

/// Main client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Backend REST base URL (e.g. `http://localhost:8000`).
    pub api_base_url: String,
    /// Chat socket URL (e.g. `ws://localhost:8000/ws/chat`).
    pub chat_socket_url: String,
    /// Seconds to wait for an assistant reply. `0` disables the timeout.
    pub thinking_timeout_secs: u64,
    /// Socket keepalive ping interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// First reconnect delay in milliseconds; doubles per attempt.
    pub reconnect_base_delay_ms: u64,
    /// Reconnect delay ceiling in milliseconds.
    pub reconnect_max_delay_ms: u64,
    /// Give up after this many consecutive failed attempts. `None` retries forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_socket_url: DEFAULT_CHAT_SOCKET_URL.to_string(),
            thinking_timeout_secs: DEFAULT_THINKING_TIMEOUT_SECS,
            heartbeat_interval_secs: 30,
            reconnect_base_delay_ms: 1_000,
            reconnect_max_delay_ms: 30_000,
            max_reconnect_attempts: None,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the config file if present, then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        if let Some(level) = env_override("LIFELINE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = env_override("LIFELINE_API_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = env_override("LIFELINE_WS_URL") {
            self.chat_socket_url = url;
        }
    }

    /// Check that both endpoints parse and use the expected schemes.
    pub fn validate(&self) -> CoreResult<()> {
        let api = self.api_base_url()?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "api_base_url must be http(s), got {}",
                api.scheme()
            )));
        }

        let socket = self.chat_socket_url()?;
        if !matches!(socket.scheme(), "ws" | "wss") {
            return Err(CoreError::Config(format!(
                "chat_socket_url must be ws(s), got {}",
                socket.scheme()
            )));
        }

        if self.reconnect_base_delay_ms > self.reconnect_max_delay_ms {
            return Err(CoreError::Config(
                "reconnect_base_delay_ms exceeds reconnect_max_delay_ms".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the backend base URL as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    /// Get the chat socket URL as a parsed URL.
    pub fn chat_socket_url(&self) -> CoreResult<Url> {
        Url::parse(&self.chat_socket_url).map_err(CoreError::from)
    }

    /// Thinking timeout, or `None` when disabled.
    pub fn thinking_timeout(&self) -> Option<Duration> {
        (self.thinking_timeout_secs > 0).then(|| Duration::from_secs(self.thinking_timeout_secs))
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}
