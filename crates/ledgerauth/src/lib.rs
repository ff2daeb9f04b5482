//! # ledgerauth
//!
//! Transaction authentication and authorization for permissioned ledgers.
//!
//! ## Overview
//!
//! Every transaction arrives signed by one or more **endpoints** (the
//! parties submitting it) and zero or more **nodes** (the peers endorsing
//! it). This crate:
//!
//! - Resolves each signer's public key to a participant [`Address`]
//! - Verifies every signature over the transaction's content hash
//! - Asks the configured security policy whether the signers are valid
//!   participants holding the required permissions
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ledgerauth::{AuthConfig, Authenticator, RequestBuilder, Requirement};
//! use ledgerauth::core::Keypair;
//!
//! let config = AuthConfig::load("auth.json").unwrap();
//! let auth = Authenticator::new(&config).unwrap();
//!
//! let client = Keypair::generate().unwrap();
//! let node = Keypair::generate().unwrap();
//! let request = RequestBuilder::new(b"transfer 10".to_vec())
//!     .endpoint(&client)
//!     .node(&node)
//!     .build()
//!     .unwrap();
//!
//! let credentials = auth.authorize(&request, &Requirement::direct_operation()).unwrap();
//! println!("authorized {:?}", credentials.single_endpoint());
//! ```
//!
//! ## Re-exports
//!
//! - `ledgerauth::core` - keys, signatures, identities, identity cache
//! - `ledgerauth::perms` - permission tags, policies, security managers

pub mod authenticator;
pub mod config;
pub mod credential;
pub mod error;
pub mod request;

#[cfg(test)]
pub(crate) mod test_support;

pub use ledgerauth_core as core;
pub use ledgerauth_perms as perms;

pub use authenticator::{Authenticator, Requirement};
pub use config::{AuthConfig, SecurityConfig};
pub use credential::{CollisionPolicy, Credential, CredentialResolver, CredentialSet, SignerRole};
pub use error::{AuthError, Result};
pub use request::{DigitalSignature, RequestBuilder, TransactionRequest};

pub use ledgerauth_core::{
    Address, AddressDeriver, Blake3AddressDeriver, BlockchainIdentity, CachePolicy, ContentHash,
    IdentityCache, KeyEncoding, Keypair, PrivateKey, PublicKey, Signature,
};
pub use ledgerauth_perms::{
    LedgerPermission, MultiIdsPolicy, Permission, SecurityManager, SecurityPolicy,
    TransactionPermission,
};
