//! Error types for registry-core

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Main error type for registry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No entry under this key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Key already taken
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Rejected input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Registry refused the request for now
    #[error("Unavailable: {0}")]
    Unavailable(String),
}
