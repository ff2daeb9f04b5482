//! # ledgerauth permissions
//!
//! Permission tags, security policies and the security managers that
//! create them.
//!
//! ## Overview
//!
//! A deployment picks one [`SecurityManager`] at configuration time. For
//! each transaction the manager creates a [`SecurityPolicy`] scoped to the
//! addresses that signed it, and the caller asks that policy whether the
//! signers are valid participants and whether they hold a permission.
//!
//! ## Variants
//!
//! - [`FullPermissionedSecurityManager`]: everything is allowed
//! - [`AllowListSecurityManager`]: listed addresses are valid and hold every permission
//! - [`RoleBasedSecurityManager`]: permissions come from roles assigned to addresses
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use ledgerauth_core::Address;
//! use ledgerauth_perms::{
//!     MultiIdsPolicy, RoleBasedSecurityManager, RoleRegistry, SecurityManager,
//!     TransactionPermission,
//! };
//!
//! let alice = Address::from_bytes(vec![0x01, 0xaa]);
//! let node = Address::from_bytes(vec![0x01, 0xbb]);
//!
//! let registry = RoleRegistry::new()
//!     .with_role("user", [TransactionPermission::DirectOperation.into()])
//!     .with_endpoint(alice.clone(), "user");
//! let manager = RoleBasedSecurityManager::new(registry).unwrap();
//!
//! let policy = manager.create_policy(BTreeSet::from([alice]), BTreeSet::from([node]));
//! assert!(policy.is_endpoint_enabled(
//!     TransactionPermission::DirectOperation.into(),
//!     MultiIdsPolicy::AtLeastOne,
//! ));
//! assert!(!policy.is_node_valid(MultiIdsPolicy::AtLeastOne));
//! ```

pub mod allow_list;
pub mod error;
pub mod full;
pub mod permission;
pub mod policy;
pub mod role;

pub use allow_list::{AllowList, AllowListPolicy, AllowListSecurityManager};
pub use error::{PermsError, Result};
pub use full::{FullPermissionedPolicy, FullPermissionedSecurityManager};
pub use permission::{all_permissions, LedgerPermission, MultiIdsPolicy, Permission, TransactionPermission};
pub use policy::{SecurityManager, SecurityPolicy};
pub use role::{RoleBasedPolicy, RoleBasedSecurityManager, RoleRegistry};
