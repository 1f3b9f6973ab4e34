//! Error types for sync-core

use fieldcall_capture_core::CaptureError;
use fieldcall_registry_core::RegistryError;
use thiserror::Error;

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport failure talking to the backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Request rejected with status {status}")]
    Rejected { status: u16 },

    /// Upload did not finish in time
    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Local queue failure
    #[error("Queue error: {0}")]
    Queue(#[from] CaptureError),

    /// In-process registry refused the request
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Interval value from the backend could not be used
    #[error("Invalid sync interval: {0}")]
    InvalidInterval(String),

    /// Stored session could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the next natural trigger may succeed without intervention
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Http(_) | SyncError::Timeout { .. } => true,
            SyncError::Rejected { status } => *status >= 500 || *status == 408 || *status == 429,
            SyncError::Queue(err) => err.is_retryable(),
            SyncError::Registry(err) => matches!(err, RegistryError::Unavailable(_)),
            SyncError::InvalidInterval(_) | SyncError::Serialization(_) => false,
        }
    }
}
