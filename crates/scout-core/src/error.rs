use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for scout.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The server answered with something other than 200 OK.
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error (refused, DNS, reset).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Main-content extraction failed.
    #[error("Cleaner error: {0}")]
    CleanerError(String),

    /// LLM API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// Search backend call failed.
    #[error("Search failed: {0}")]
    SearchError(String),

    /// Missing or invalid configuration (API keys, endpoints).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The caller passed arguments the operation cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Local file could not be read.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// HTTP status carried by the error, if the exchange completed.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::HttpStatus { status, .. } => Some(*status),
            AppError::LlmError { status_code, .. } if *status_code != 0 => Some(*status_code),
            _ => None,
        }
    }

    /// Timeout after `after`, rounded up to whole seconds so sub-second
    /// budgets never read as zero.
    pub fn timed_out(after: Duration) -> Self {
        AppError::Timeout(timeout_secs(after))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }
}

/// Whole seconds in `timeout`, rounded up.
pub fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}
