//! Security policy contract.
//!
//! A [`SecurityManager`] is chosen once at configuration time. For every
//! transaction it creates a [`SecurityPolicy`] scoped to the endpoint and
//! node addresses that signed it. The policy answers two independent
//! questions under a [`MultiIdsPolicy`]:
//!
//! - **Permission**: do the signers hold a given permission tag?
//! - **Validity**: are the signers recognized participants at all?
//!
//! Callers only ever see `dyn SecurityPolicy`; all variants answer through
//! the same methods.

use std::collections::BTreeSet;
use std::fmt;

use ledgerauth_core::Address;

use crate::error::{PermsError, Result};
use crate::permission::{MultiIdsPolicy, Permission};

/// Predicates over the addresses captured for one evaluation.
///
/// The `is_*` predicates never fail. The `check_*` methods turn a false
/// predicate into [`PermsError::SecurityDenied`].
pub trait SecurityPolicy: Send + Sync + fmt::Debug {
    /// Endpoint addresses captured at construction.
    fn endpoints(&self) -> &BTreeSet<Address>;

    /// Node addresses captured at construction.
    fn nodes(&self) -> &BTreeSet<Address>;

    fn is_endpoint_enabled(&self, permission: Permission, rule: MultiIdsPolicy) -> bool;

    fn is_node_enabled(&self, permission: Permission, rule: MultiIdsPolicy) -> bool;

    fn is_endpoint_valid(&self, rule: MultiIdsPolicy) -> bool;

    fn is_node_valid(&self, rule: MultiIdsPolicy) -> bool;

    fn check_endpoint_permission(&self, permission: Permission, rule: MultiIdsPolicy) -> Result<()> {
        if self.is_endpoint_enabled(permission, rule) {
            return Ok(());
        }
        Err(denied("endpoint", self.endpoints(), Some(permission), rule))
    }

    fn check_node_permission(&self, permission: Permission, rule: MultiIdsPolicy) -> Result<()> {
        if self.is_node_enabled(permission, rule) {
            return Ok(());
        }
        Err(denied("node", self.nodes(), Some(permission), rule))
    }

    fn check_endpoint_validity(&self, rule: MultiIdsPolicy) -> Result<()> {
        if self.is_endpoint_valid(rule) {
            return Ok(());
        }
        Err(denied("endpoint", self.endpoints(), None, rule))
    }

    fn check_node_validity(&self, rule: MultiIdsPolicy) -> Result<()> {
        if self.is_node_valid(rule) {
            return Ok(());
        }
        Err(denied("node", self.nodes(), None, rule))
    }
}

fn denied(
    role: &str,
    addresses: &BTreeSet<Address>,
    permission: Option<Permission>,
    rule: MultiIdsPolicy,
) -> PermsError {
    let who = addresses
        .iter()
        .map(|a| format!("{a:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    match permission {
        Some(p) => PermsError::SecurityDenied(format!(
            "{role} [{who}] lacks {p} under {rule} rule"
        )),
        None => PermsError::SecurityDenied(format!(
            "{role} [{who}] not valid under {rule} rule"
        )),
    }
}

/// Factory for per-transaction policies.
pub trait SecurityManager: Send + Sync + fmt::Debug {
    fn create_policy(
        &self,
        endpoints: BTreeSet<Address>,
        nodes: BTreeSet<Address>,
    ) -> Box<dyn SecurityPolicy>;

    /// Policy for a transaction endorsed by a single node.
    fn create_single_node_policy(
        &self,
        endpoints: BTreeSet<Address>,
        node: Address,
    ) -> Box<dyn SecurityPolicy> {
        self.create_policy(endpoints, BTreeSet::from([node]))
    }

    /// Policy for one endpoint and one node.
    fn create_single_policy(&self, endpoint: Address, node: Address) -> Box<dyn SecurityPolicy> {
        self.create_policy(BTreeSet::from([endpoint]), BTreeSet::from([node]))
    }
}
