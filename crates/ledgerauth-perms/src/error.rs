//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission evaluation.
#[derive(Debug, Error)]
pub enum PermsError {
    /// A permission or validity check failed.
    #[error("security denied: {0}")]
    SecurityDenied(String),

    /// A policy definition is inconsistent.
    #[error("invalid policy configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
