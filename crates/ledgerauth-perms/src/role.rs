//! Role-based security manager.
//!
//! A [`RoleRegistry`] names roles, gives each a set of permission tags, and
//! assigns roles to endpoint and node addresses. An address is valid when it
//! is registered, and holds a permission when any of its roles carries it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ledgerauth_core::Address;

use crate::error::{PermsError, Result};
use crate::permission::{MultiIdsPolicy, Permission};
use crate::policy::{SecurityManager, SecurityPolicy};

/// Roles and the role assignments of known participants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    /// Role name to the permissions it grants.
    #[serde(default)]
    pub roles: BTreeMap<String, BTreeSet<Permission>>,

    /// Endpoint address to assigned role names.
    #[serde(default)]
    pub endpoints: BTreeMap<Address, BTreeSet<String>>,

    /// Node address to assigned role names.
    #[serde(default)]
    pub nodes: BTreeMap<Address, BTreeSet<String>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or extend) a role.
    pub fn with_role(
        mut self,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        self.roles.entry(name.into()).or_default().extend(permissions);
        self
    }

    /// Register an endpoint with a role. Registering with no role at all is
    /// done through [`RoleRegistry::register_endpoint`].
    pub fn with_endpoint(mut self, address: Address, role: impl Into<String>) -> Self {
        self.endpoints.entry(address).or_default().insert(role.into());
        self
    }

    pub fn with_node(mut self, address: Address, role: impl Into<String>) -> Self {
        self.nodes.entry(address).or_default().insert(role.into());
        self
    }

    /// Register an endpoint without granting it anything.
    pub fn register_endpoint(&mut self, address: Address) {
        self.endpoints.entry(address).or_default();
    }

    pub fn register_node(&mut self, address: Address) {
        self.nodes.entry(address).or_default();
    }

    /// Check that every assigned role is defined.
    pub fn validate(&self) -> Result<()> {
        let assignments = self
            .endpoints
            .iter()
            .map(|(a, r)| ("endpoint", a, r))
            .chain(self.nodes.iter().map(|(a, r)| ("node", a, r)));

        for (kind, address, roles) in assignments {
            if let Some(missing) = roles.iter().find(|r| !self.roles.contains_key(*r)) {
                return Err(PermsError::InvalidConfig(format!(
                    "{kind} {address} assigned undefined role {missing:?}"
                )));
            }
        }
        Ok(())
    }

    /// Whether `address`'s roles grant `permission`.
    ///
    /// Unregistered addresses hold nothing.
    fn grants(
        &self,
        assignments: &BTreeMap<Address, BTreeSet<String>>,
        address: &Address,
        permission: &Permission,
    ) -> bool {
        let Some(roles) = assignments.get(address) else {
            return false;
        };
        roles
            .iter()
            .filter_map(|r| self.roles.get(r))
            .any(|perms| perms.contains(permission))
    }

    pub fn endpoint_permissions(&self, address: &Address) -> BTreeSet<Permission> {
        self.collect(&self.endpoints, address)
    }

    pub fn node_permissions(&self, address: &Address) -> BTreeSet<Permission> {
        self.collect(&self.nodes, address)
    }

    fn collect(
        &self,
        assignments: &BTreeMap<Address, BTreeSet<String>>,
        address: &Address,
    ) -> BTreeSet<Permission> {
        assignments
            .get(address)
            .into_iter()
            .flatten()
            .filter_map(|r| self.roles.get(r))
            .flatten()
            .copied()
            .collect()
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| PermsError::SerializationError(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| PermsError::SerializationError(e.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct RoleBasedSecurityManager {
    registry: Arc<RoleRegistry>,
}

impl RoleBasedSecurityManager {
    /// Fails with [`PermsError::InvalidConfig`] if the registry references
    /// an undefined role.
    pub fn new(registry: RoleRegistry) -> Result<Self> {
        registry.validate()?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }
}

impl SecurityManager for RoleBasedSecurityManager {
    fn create_policy(
        &self,
        endpoints: BTreeSet<Address>,
        nodes: BTreeSet<Address>,
    ) -> Box<dyn SecurityPolicy> {
        Box::new(RoleBasedPolicy {
            registry: Arc::clone(&self.registry),
            endpoints,
            nodes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RoleBasedPolicy {
    registry: Arc<RoleRegistry>,
    endpoints: BTreeSet<Address>,
    nodes: BTreeSet<Address>,
}

impl SecurityPolicy for RoleBasedPolicy {
    fn endpoints(&self) -> &BTreeSet<Address> {
        &self.endpoints
    }

    fn nodes(&self) -> &BTreeSet<Address> {
        &self.nodes
    }

    fn is_endpoint_enabled(&self, permission: Permission, rule: MultiIdsPolicy) -> bool {
        let registry = &self.registry;
        rule.evaluate(&self.endpoints, |a| {
            registry.grants(&registry.endpoints, a, &permission)
        })
    }

    fn is_node_enabled(&self, permission: Permission, rule: MultiIdsPolicy) -> bool {
        let registry = &self.registry;
        rule.evaluate(&self.nodes, |a| registry.grants(&registry.nodes, a, &permission))
    }

    fn is_endpoint_valid(&self, rule: MultiIdsPolicy) -> bool {
        rule.evaluate(&self.endpoints, |a| self.registry.endpoints.contains_key(a))
    }

    fn is_node_valid(&self, rule: MultiIdsPolicy) -> bool {
        rule.evaluate(&self.nodes, |a| self.registry.nodes.contains_key(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{LedgerPermission, TransactionPermission};
    use proptest::prelude::*;

    fn addr(b: u8) -> Address {
        Address::from_bytes(vec![b])
    }

    fn registry() -> RoleRegistry {
        RoleRegistry::new()
            .with_role("user", [TransactionPermission::DirectOperation.into()])
            .with_role(
                "admin",
                [
                    LedgerPermission::RegisterUser.into(),
                    LedgerPermission::ConfigureRoles.into(),
                    TransactionPermission::ContractOperation.into(),
                ],
            )
            .with_role("validator", [LedgerPermission::ApproveTx.into()])
            .with_endpoint(addr(1), "user")
            .with_endpoint(addr(2), "user")
            .with_endpoint(addr(2), "admin")
            .with_node(addr(10), "validator")
    }

    fn manager() -> RoleBasedSecurityManager {
        RoleBasedSecurityManager::new(registry()).unwrap()
    }

    #[test]
    fn test_permission_from_role() {
        let policy = manager().create_single_policy(addr(1), addr(10));
        let direct = TransactionPermission::DirectOperation.into();
        let contract = TransactionPermission::ContractOperation.into();

        assert!(policy.is_endpoint_enabled(direct, MultiIdsPolicy::All));
        assert!(!policy.is_endpoint_enabled(contract, MultiIdsPolicy::All));
        assert!(policy.check_endpoint_permission(contract, MultiIdsPolicy::All).is_err());
        assert!(policy.is_node_enabled(LedgerPermission::ApproveTx.into(), MultiIdsPolicy::All));
    }

    #[test]
    fn test_union_of_roles() {
        let perms = registry().endpoint_permissions(&addr(2));
        assert_eq!(perms.len(), 4);
        assert!(perms.contains(&LedgerPermission::RegisterUser.into()));
        assert!(perms.contains(&TransactionPermission::DirectOperation.into()));
        assert!(registry().endpoint_permissions(&addr(99)).is_empty());
    }

    #[test]
    fn test_any_vs_all() {
        let policy = manager().create_policy(BTreeSet::from([addr(1), addr(2)]), BTreeSet::new());
        let register = LedgerPermission::RegisterUser.into();

        assert!(policy.is_endpoint_enabled(register, MultiIdsPolicy::AtLeastOne));
        assert!(!policy.is_endpoint_enabled(register, MultiIdsPolicy::All));
        assert!(policy.is_endpoint_valid(MultiIdsPolicy::All));
    }

    #[test]
    fn test_registered_without_roles_is_valid_but_powerless() {
        let mut registry = registry();
        registry.register_endpoint(addr(5));
        let manager = RoleBasedSecurityManager::new(registry).unwrap();
        let policy = manager.create_single_policy(addr(5), addr(10));

        assert!(policy.is_endpoint_valid(MultiIdsPolicy::All));
        assert!(!policy.is_endpoint_enabled(
            TransactionPermission::DirectOperation.into(),
            MultiIdsPolicy::AtLeastOne
        ));
    }

    #[test]
    fn test_unregistered_is_invalid() {
        let policy = manager().create_single_policy(addr(3), addr(11));
        assert!(!policy.is_endpoint_valid(MultiIdsPolicy::AtLeastOne));
        assert!(!policy.is_node_valid(MultiIdsPolicy::AtLeastOne));
        assert!(policy.check_node_validity(MultiIdsPolicy::AtLeastOne).is_err());
    }

    #[test]
    fn test_node_role_does_not_leak_to_endpoints() {
        // Address 10 is a node only.
        let policy = manager().create_single_policy(addr(10), addr(10));
        assert!(!policy.is_endpoint_valid(MultiIdsPolicy::All));
        assert!(policy.is_node_valid(MultiIdsPolicy::All));
    }

    #[test]
    fn test_undefined_role_rejected() {
        let registry = registry().with_node(addr(11), "ghost");
        let err = RoleBasedSecurityManager::new(registry).unwrap_err();
        assert!(matches!(err, PermsError::InvalidConfig(_)));
    }

    #[test]
    fn test_registry_cbor_roundtrip() {
        let registry = registry();
        let recovered = RoleRegistry::from_bytes(&registry.to_bytes().unwrap()).unwrap();
        assert_eq!(registry, recovered);
        assert!(RoleRegistry::from_bytes(&[0xff, 0x00]).is_err());
    }

    #[test]
    fn test_registry_json_shape() {
        let json = r#"{
            "roles": {"user": ["direct_operation", "register_user"]},
            "endpoints": {"0a0b": ["user"]}
        }"#;
        let registry: RoleRegistry = serde_json::from_str(json).unwrap();
        let address = Address::from_bytes(vec![0x0a, 0x0b]);

        assert!(registry.nodes.is_empty());
        assert_eq!(registry.endpoint_permissions(&address).len(), 2);
        registry.validate().unwrap();
    }

    proptest! {
        #[test]
        fn prop_enabled_implies_valid(
            signers in prop::collection::btree_set(0u8..12, 0..5),
            pick in 0usize..15,
        ) {
            let permission = crate::permission::all_permissions()
                .into_iter()
                .nth(pick)
                .unwrap();
            let nodes: BTreeSet<Address> = signers.iter().copied().map(addr).collect();
            let policy = manager().create_policy(BTreeSet::new(), nodes);

            for rule in [MultiIdsPolicy::AtLeastOne, MultiIdsPolicy::All] {
                if policy.is_node_enabled(permission, rule) {
                    prop_assert!(policy.is_node_valid(rule));
                }
            }
        }
    }
}
