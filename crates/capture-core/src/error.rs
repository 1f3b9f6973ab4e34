//! Error types for capture-core

use thiserror::Error;

/// Result type alias for capture and queue operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Main error type for capture-core
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Local queue storage failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored row could not be decoded into a record
    #[error("Corrupt queue row: {0}")]
    CorruptRow(String),

    /// Device call log could not be read
    #[error("Call log provider error: {0}")]
    CallLog(String),

    /// Record violates a data model rule
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CaptureError {
    /// Whether the operation may succeed if attempted again on the next trigger
    pub fn is_retryable(&self) -> bool {
        matches!(self, CaptureError::Database(_) | CaptureError::CallLog(_))
    }
}

impl From<config::ConfigError> for CaptureError {
    fn from(err: config::ConfigError) -> Self {
        CaptureError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Internal(err.to_string())
    }
}
