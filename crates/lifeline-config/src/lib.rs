//! Configuration, file system paths, and logging setup for the LifeLine client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_CHAT_SOCKET_URL, DEFAULT_LOG_LEVEL,
    DEFAULT_THINKING_TIMEOUT_SECS,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
