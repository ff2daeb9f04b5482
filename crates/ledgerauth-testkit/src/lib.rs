//! # ledgerauth testkit
//!
//! Testing utilities for ledgerauth.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a shared pool of seeded key pairs, signed requests and
//!   matching allow lists or role registries
//! - **Generators**: Proptest strategies for property-based testing
//! - **Vectors**: ciphertext geometry every implementation must agree on
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use ledgerauth::{Authenticator, Requirement};
//! use ledgerauth_testkit::TestFixture;
//!
//! let fixture = TestFixture::new(2, 1);
//! let auth = Authenticator::new(&fixture.role_based_config()).unwrap();
//! auth.authorize(&fixture.request(b"payload"), &Requirement::direct_operation())
//!     .unwrap();
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ledgerauth_testkit::generators::{request_from_params, RequestParams};
//!
//! proptest! {
//!     #[test]
//!     fn content_hash_matches(params: RequestParams) {
//!         prop_assert!(request_from_params(&params).is_content_hash_valid());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{address_of, seeded_keypair, shared_keypairs, TestFixture};
pub use generators::{request_from_params, RequestParams};
pub use vectors::{all_vectors, verify_vectors, ChunkVector};
