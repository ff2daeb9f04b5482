//! The fully permissioned security manager.
//!
//! Every predicate is true and no check fails. Suitable for closed test
//! networks and deployments that enforce access control elsewhere.

use std::collections::BTreeSet;

use ledgerauth_core::Address;

use crate::permission::{MultiIdsPolicy, Permission};
use crate::policy::{SecurityManager, SecurityPolicy};

#[derive(Debug, Clone, Copy, Default)]
pub struct FullPermissionedSecurityManager;

impl SecurityManager for FullPermissionedSecurityManager {
    fn create_policy(
        &self,
        endpoints: BTreeSet<Address>,
        nodes: BTreeSet<Address>,
    ) -> Box<dyn SecurityPolicy> {
        Box::new(FullPermissionedPolicy { endpoints, nodes })
    }
}

#[derive(Debug, Clone)]
pub struct FullPermissionedPolicy {
    endpoints: BTreeSet<Address>,
    nodes: BTreeSet<Address>,
}

impl SecurityPolicy for FullPermissionedPolicy {
    fn endpoints(&self) -> &BTreeSet<Address> {
        &self.endpoints
    }

    fn nodes(&self) -> &BTreeSet<Address> {
        &self.nodes
    }

    fn is_endpoint_enabled(&self, _permission: Permission, _rule: MultiIdsPolicy) -> bool {
        true
    }

    fn is_node_enabled(&self, _permission: Permission, _rule: MultiIdsPolicy) -> bool {
        true
    }

    fn is_endpoint_valid(&self, _rule: MultiIdsPolicy) -> bool {
        true
    }

    fn is_node_valid(&self, _rule: MultiIdsPolicy) -> bool {
        true
    }
}
