//! Allow-list security manager.
//!
//! Listed addresses are valid participants and hold every permission;
//! anything else is neither valid nor permitted.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ledgerauth_core::Address;

use crate::permission::{MultiIdsPolicy, Permission};
use crate::policy::{SecurityManager, SecurityPolicy};

/// The listed endpoint and node addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    #[serde(default)]
    pub endpoints: BTreeSet<Address>,
    #[serde(default)]
    pub nodes: BTreeSet<Address>,
}

impl AllowList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, address: Address) -> Self {
        self.endpoints.insert(address);
        self
    }

    pub fn with_node(mut self, address: Address) -> Self {
        self.nodes.insert(address);
        self
    }
}

#[derive(Debug, Clone)]
pub struct AllowListSecurityManager {
    list: Arc<AllowList>,
}

impl AllowListSecurityManager {
    pub fn new(list: AllowList) -> Self {
        Self {
            list: Arc::new(list),
        }
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.list
    }
}

impl SecurityManager for AllowListSecurityManager {
    fn create_policy(
        &self,
        endpoints: BTreeSet<Address>,
        nodes: BTreeSet<Address>,
    ) -> Box<dyn SecurityPolicy> {
        Box::new(AllowListPolicy {
            list: Arc::clone(&self.list),
            endpoints,
            nodes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    list: Arc<AllowList>,
    endpoints: BTreeSet<Address>,
    nodes: BTreeSet<Address>,
}

impl SecurityPolicy for AllowListPolicy {
    fn endpoints(&self) -> &BTreeSet<Address> {
        &self.endpoints
    }

    fn nodes(&self) -> &BTreeSet<Address> {
        &self.nodes
    }

    fn is_endpoint_enabled(&self, _permission: Permission, rule: MultiIdsPolicy) -> bool {
        self.is_endpoint_valid(rule)
    }

    fn is_node_enabled(&self, _permission: Permission, rule: MultiIdsPolicy) -> bool {
        self.is_node_valid(rule)
    }

    fn is_endpoint_valid(&self, rule: MultiIdsPolicy) -> bool {
        rule.evaluate(&self.endpoints, |a| self.list.endpoints.contains(a))
    }

    fn is_node_valid(&self, rule: MultiIdsPolicy) -> bool {
        rule.evaluate(&self.nodes, |a| self.list.nodes.contains(a))
    }
}
