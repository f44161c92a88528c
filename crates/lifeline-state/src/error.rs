//! Client state store error types.

use thiserror::Error;

/// Client state store error type.
#[derive(Error, Debug)]
pub enum StateError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Backend answered 2xx with a body missing required data
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Input rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Preferences have not been loaded")]
    PreferencesNotLoaded,

    #[error("User has already completed onboarding")]
    AlreadyOnboarded,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias using StateError.
pub type StateResult<T> = Result<T, StateError>;
