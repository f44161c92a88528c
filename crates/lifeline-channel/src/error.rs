//! Chat channel error types.

use thiserror::Error;

/// Chat channel error type.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The channel is not connected; nothing was sent or queued
    #[error("Not connected to chat server")]
    NotConnected,

    /// Inbound frame could not be interpreted
    #[error("Protocol anomaly: {0}")]
    Protocol(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Outbound frame could not be handed to the socket writer
    #[error("Failed to send message: {0}")]
    Send(String),

    /// Message text was empty after trimming
    #[error("Message is empty")]
    EmptyMessage,
}

/// Result type alias using ChannelError.
pub type ChannelResult<T> = Result<T, ChannelError>;
