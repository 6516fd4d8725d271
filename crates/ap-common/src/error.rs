//! Error types for agent plugins.

use thiserror::Error;

/// Result type alias for plugin runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the plugin runtime.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid lifecycle transition: {0}")]
    Lifecycle(String),

    // Protocol errors (20-29)
    #[error("command must be a JSON object")]
    NotAnObject,

    #[error("invalid {field}: {message}")]
    InvalidRequest { field: String, message: String },

    // Source errors (30-39)
    #[error("metrics source failed: {0}")]
    Source(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in log output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::Lifecycle(_) => 11,
            Error::NotAnObject => 20,
            Error::InvalidRequest { .. } => 21,
            Error::Source(_) => 30,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Internal(_) => 99,
        }
    }

    /// Shorthand for a malformed request field.
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }
}
