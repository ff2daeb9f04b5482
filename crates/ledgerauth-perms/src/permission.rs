//! Permission tags and multi-identity aggregation rules.
//!
//! Policies treat permissions as opaque tags: they only ever test whether
//! a tag is held, never interpret it.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use ledgerauth_core::Address;

/// Ledger-level permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPermission {
    ConfigureRoles,
    AuthorizeUserRoles,
    SetConsensus,
    SetCrypto,
    RegisterParticipant,
    RegisterUser,
    RegisterDataAccount,
    RegisterContract,
    UpgradeContract,
    SetUserAttributes,
    WriteDataAccount,
    /// Endorse (co-sign) a transaction as a node.
    ApproveTx,
    /// Take part in consensus.
    ConsensusTx,
}

/// Transaction-level permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPermission {
    /// Submit operations directly.
    DirectOperation,
    /// Invoke contracts.
    ContractOperation,
}

/// Any permission tag.
///
/// Serializes as the bare snake_case tag name, e.g. `"register_user"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permission {
    Ledger(LedgerPermission),
    Transaction(TransactionPermission),
}

impl From<LedgerPermission> for Permission {
    fn from(p: LedgerPermission) -> Self {
        Permission::Ledger(p)
    }
}

impl From<TransactionPermission> for Permission {
    fn from(p: TransactionPermission) -> Self {
        Permission::Transaction(p)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Ledger(p) => write!(f, "ledger:{p:?}"),
            Permission::Transaction(p) => write!(f, "tx:{p:?}"),
        }
    }
}

/// How a predicate is aggregated across several addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiIdsPolicy {
    /// At least one address must satisfy the predicate.
    #[default]
    AtLeastOne,
    /// Every address must satisfy the predicate.
    All,
}

impl MultiIdsPolicy {
    /// Aggregate `predicate` over `addresses`.
    ///
    /// An empty set never satisfies either rule: a check with no signer
    /// behind it is denied.
    pub fn evaluate<F>(&self, addresses: &BTreeSet<Address>, predicate: F) -> bool
    where
        F: FnMut(&Address) -> bool,
    {
        if addresses.is_empty() {
            return false;
        }
        match self {
            MultiIdsPolicy::AtLeastOne => addresses.iter().any(predicate),
            MultiIdsPolicy::All => addresses.iter().all(predicate),
        }
    }
}

impl fmt::Display for MultiIdsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultiIdsPolicy::AtLeastOne => f.write_str("at-least-one"),
            MultiIdsPolicy::All => f.write_str("all"),
        }
    }
}

/// Every permission tag, for fully privileged roles.
pub fn all_permissions() -> BTreeSet<Permission> {
    use LedgerPermission::*;
    use TransactionPermission::*;

    [
        ConfigureRoles,
        AuthorizeUserRoles,
        SetConsensus,
        SetCrypto,
        RegisterParticipant,
        RegisterUser,
        RegisterDataAccount,
        RegisterContract,
        UpgradeContract,
        SetUserAttributes,
        WriteDataAccount,
        ApproveTx,
        ConsensusTx,
    ]
    .into_iter()
    .map(Permission::from)
    .chain([DirectOperation, ContractOperation].into_iter().map(Permission::from))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(bytes: &[u8]) -> BTreeSet<Address> {
        bytes.iter().map(|b| Address::from_bytes(vec![*b])).collect()
    }

    #[test]
    fn test_at_least_one() {
        let set = addresses(&[1, 2, 3]);
        assert!(MultiIdsPolicy::AtLeastOne.evaluate(&set, |a| a.as_bytes() == [2]));
        assert!(!MultiIdsPolicy::AtLeastOne.evaluate(&set, |a| a.as_bytes() == [9]));
    }

    #[test]
    fn test_all() {
        let set = addresses(&[1, 2, 3]);
        assert!(MultiIdsPolicy::All.evaluate(&set, |a| a.as_bytes()[0] < 4));
        assert!(!MultiIdsPolicy::All.evaluate(&set, |a| a.as_bytes() != [3]));
    }

    #[test]
    fn test_empty_set_is_denied() {
        let empty = BTreeSet::new();
        assert!(!MultiIdsPolicy::AtLeastOne.evaluate(&empty, |_| true));
        assert!(!MultiIdsPolicy::All.evaluate(&empty, |_| true));
    }

    #[test]
    fn test_permission_serializes_as_tag_name() {
        let p = Permission::from(LedgerPermission::RegisterUser);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"register_user\"");

        let t: Permission = serde_json::from_str("\"contract_operation\"").unwrap();
        assert_eq!(t, Permission::from(TransactionPermission::ContractOperation));

        assert!(serde_json::from_str::<Permission>("\"fly\"").is_err());
    }

    #[test]
    fn test_all_permissions_covers_both_families() {
        let all = all_permissions();
        assert_eq!(all.len(), 15);
        assert!(all.contains(&LedgerPermission::ApproveTx.into()));
        assert!(all.contains(&TransactionPermission::DirectOperation.into()));
    }
}
