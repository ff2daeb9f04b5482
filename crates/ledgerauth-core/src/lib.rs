//! # ledgerauth core
//!
//! Pure primitives for transaction authentication: RSA keys in three
//! encodings, signatures, chunked encryption, participant identities and
//! the identity cache.
//!
//! This crate performs no I/O. Everything is synchronous computation.
//!
//! ## Key Types
//!
//! - [`PublicKey`] / [`PrivateKey`] / [`Keypair`] - RSA keys with CRT parameters
//! - [`KeyEncoding`] - Raw, PKCS#1 and PKCS#8 byte encodings
//! - [`Address`] - one-way identifier derived from a public key
//! - [`BlockchainIdentity`] - an address together with its public key
//! - [`IdentityCache`] - sharded memo from public key to identity
//!
//! ## Encodings
//!
//! The Raw layout is described in the [`raw`] module. PKCS#1 and PKCS#8 are
//! the standard DER structures and interoperate with other RSA libraries.

pub mod cache;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod keys;
pub mod raw;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::{CachePolicy, CacheStats, IdentityCache};
pub use crypto::{
    decrypt, decrypt_raw, encrypt, encrypt_block, encrypt_raw, sign, sign_raw, verify,
    verify_raw, ContentHash, Signature, PKCS1_PADDING_OVERHEAD,
};
pub use error::{CoreError, Result};
pub use identity::{Address, AddressDeriver, Blake3AddressDeriver, BlockchainIdentity};
pub use keys::{
    retrieve_public_key, AsymmetricKey, KeyEncoding, Keypair, PrivateKey, PublicKey,
    DEFAULT_KEY_BITS,
};
