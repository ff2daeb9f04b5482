//! Authentication configuration.
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid
//! configuration: fully permissioned, unbounded identity cache, duplicate
//! signers rejected, signatures verified.
//!
//! ```json
//! {
//!   "security": {
//!     "mode": "role_based",
//!     "roles": { "user": ["direct_operation"] },
//!     "endpoints": { "01aa...": ["user"] },
//!     "nodes": {}
//!   },
//!   "identity_cache": { "kind": "bounded", "max_entries": 10000 },
//!   "collision": "reject",
//!   "verify_signatures": true
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ledgerauth_core::CachePolicy;
use ledgerauth_perms::{
    AllowList, AllowListSecurityManager, FullPermissionedSecurityManager,
    RoleBasedSecurityManager, RoleRegistry, SecurityManager,
};

use crate::credential::CollisionPolicy;
use crate::error::{AuthError, Result};

/// Which security manager to run, with its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SecurityConfig {
    #[default]
    Full,
    AllowList(AllowList),
    RoleBased(RoleRegistry),
}

impl SecurityConfig {
    /// Instantiate the configured manager.
    pub fn build(&self) -> Result<Arc<dyn SecurityManager>> {
        let manager: Arc<dyn SecurityManager> = match self {
            SecurityConfig::Full => Arc::new(FullPermissionedSecurityManager),
            SecurityConfig::AllowList(list) => Arc::new(AllowListSecurityManager::new(list.clone())),
            SecurityConfig::RoleBased(registry) => {
                Arc::new(RoleBasedSecurityManager::new(registry.clone())?)
            }
        };
        Ok(manager)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub security: SecurityConfig,
    pub identity_cache: CachePolicy,
    pub collision: CollisionPolicy,
    /// Verify every signature over the content hash before policy checks.
    pub verify_signatures: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            security: SecurityConfig::default(),
            identity_cache: CachePolicy::default(),
            collision: CollisionPolicy::default(),
            verify_signatures: true,
        }
    }
}

impl AuthConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AuthError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerauth_core::Address;
    use ledgerauth_perms::{MultiIdsPolicy, PermsError, TransactionPermission};
    use std::collections::BTreeSet;

    #[test]
    fn test_empty_json_is_default() {
        let config = AuthConfig::from_json("{}").unwrap();
        assert_eq!(config, AuthConfig::default());
        assert!(config.verify_signatures);
        assert_eq!(config.collision, CollisionPolicy::Reject);
        assert_eq!(config.identity_cache, CachePolicy::Unbounded);
    }

    #[test]
    fn test_allow_list_config() {
        let json = r#"{
            "security": { "mode": "allow_list", "endpoints": ["01aa"], "nodes": ["01bb"] },
            "collision": "last_write_wins",
            "identity_cache": { "kind": "bounded", "max_entries": 64 }
        }"#;
        let config = AuthConfig::from_json(json).unwrap();

        assert_eq!(config.collision, CollisionPolicy::LastWriteWins);
        assert_eq!(config.identity_cache, CachePolicy::Bounded { max_entries: 64 });

        let endpoint = Address::from_hex("01aa").unwrap();
        let node = Address::from_hex("01bb").unwrap();
        let manager = config.security.build().unwrap();
        let policy = manager.create_single_policy(endpoint, node);
        assert!(policy.is_endpoint_valid(MultiIdsPolicy::All));
        assert!(policy.is_node_valid(MultiIdsPolicy::All));
    }

    #[test]
    fn test_role_based_config() {
        let json = r#"{
            "security": {
                "mode": "role_based",
                "roles": { "user": ["direct_operation"] },
                "endpoints": { "01aa": ["user"] }
            }
        }"#;
        let config = AuthConfig::from_json(json).unwrap();
        let manager = config.security.build().unwrap();

        let endpoint = Address::from_hex("01aa").unwrap();
        let policy = manager.create_policy(BTreeSet::from([endpoint]), BTreeSet::new());
        assert!(policy.is_endpoint_enabled(
            TransactionPermission::DirectOperation.into(),
            MultiIdsPolicy::All
        ));
        assert!(!policy.is_endpoint_enabled(
            TransactionPermission::ContractOperation.into(),
            MultiIdsPolicy::All
        ));
    }

    #[test]
    fn test_undefined_role_fails_build() {
        let json = r#"{
            "security": { "mode": "role_based", "endpoints": { "01aa": ["ghost"] } }
        }"#;
        let config = AuthConfig::from_json(json).unwrap();
        assert!(matches!(
            config.security.build(),
            Err(AuthError::Permission(PermsError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(AuthConfig::from_json("{"), Err(AuthError::Config(_))));
        assert!(matches!(
            AuthConfig::from_json(r#"{"security": {"mode": "open_door"}}"#),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            AuthConfig::from_json(r#"{"security": {"mode": "allow_list", "endpoints": ["zz"]}}"#),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AuthConfig {
            security: SecurityConfig::AllowList(
                AllowList::new().with_endpoint(Address::from_bytes(vec![1, 2])),
            ),
            identity_cache: CachePolicy::Bounded { max_entries: 8 },
            collision: CollisionPolicy::LastWriteWins,
            verify_signatures: false,
        };
        let recovered = AuthConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, recovered);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, r#"{"verify_signatures": false}"#).unwrap();

        let config = AuthConfig::load(&path).unwrap();
        assert!(!config.verify_signatures);
        assert_eq!(config.security, SecurityConfig::Full);

        let missing = AuthConfig::load(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(AuthError::Config(_))));
    }
}
