//! # Observability
//!
//! Centralized logging for the LifeLine client.
//!
//! Binaries call `observability::init()` once at startup and use standard
//! `tracing` macros everywhere else. Library crates never install a
//! subscriber themselves; they only emit events.
//!
//! Every event is written as one JSON line to a single append-only file,
//! `~/.lifeline/logs/lifeline.jsonl` by default, so a session can be followed
//! with `tail -f ~/.lifeline/logs/lifeline.jsonl | jq`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("cli");
//!     tracing::info!("client started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "cli".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

mod file;
mod json_layer;

use std::path::PathBuf;

pub use file::{default_log_path, LogFileWriter};
pub use json_layer::{JsonLayer, LogEntry};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "cli", "chat").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.lifeline/logs/lifeline.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize the observability layer with default settings.
///
/// ```rust,ignore
/// observability::init("cli");
/// tracing::info!("ready");
/// ```
///
/// Falls back to stderr-only logging if the log file cannot be opened.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Installs the global subscriber. Calling it twice is a no-op for the
/// second call.
pub fn init_with_config(config: LogConfig) {
    file::init_file_subscriber(&config);
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export the span macro for structured context.
pub use tracing::span;

/// Re-export Level for advanced filtering.
pub use tracing::Level;
