//! Logging initialization for the client.
//!
//! Thin wrapper over the observability crate: structured JSONL goes to
//! [`Paths::log_file`], level comes from `RUST_LOG` or the configured default.

use crate::Paths;
use observability::LogConfig;

/// Initialize the logging system.
///
/// # Arguments
///
/// * `service_name` - Name written into every log line
/// * `level` - Default log level (trace, debug, info, warn, error)
/// * `paths` - Client directories; lines go to `paths.log_file()`
/// * `also_stderr` - Mirror log lines to stderr
///
/// # Example
///
/// ```ignore
/// let paths = Paths::new()?;
/// init_logging("cli", "info", &paths, false);
/// tracing::info!("client started");
/// ```
pub fn init_logging(service_name: &str, level: &str, paths: &Paths, also_stderr: bool) {
    observability::init_with_config(log_config(service_name, level, paths, also_stderr));
}

fn log_config(service_name: &str, level: &str, paths: &Paths, also_stderr: bool) -> LogConfig {
    LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr,
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
