//! Error types for ledgerauth core.

use thiserror::Error;

/// Errors raised by the key codec and the cryptographic primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or truncated key, signature or request bytes.
    #[error("format error: {0}")]
    Format(String),

    /// Decryption failed.
    ///
    /// Every decryption failure maps to this single variant, whatever the
    /// underlying cause.
    #[error("decryption failed")]
    Padding,

    /// A single block was asked to carry more than its capacity.
    #[error("payload of {len} bytes exceeds block capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("crypto error: {0}")]
    Crypto(String),
}

impl CoreError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        CoreError::Format(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
