//! Error types for authentication and authorization.

use ledgerauth_core::{Address, CoreError};
use ledgerauth_perms::PermsError;
use thiserror::Error;

use crate::credential::SignerRole;

/// Errors that can occur while authenticating or authorizing a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Key decoding or cryptographic failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Validity or permission check failed.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// Two signatures in one list resolve to the same address.
    #[error("duplicate {role} signer: {address}")]
    DuplicateSigner { role: SignerRole, address: Address },

    /// A signature does not verify over the content hash.
    #[error("invalid signature from {0}")]
    InvalidSignature(Address),

    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for ledgerauth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
