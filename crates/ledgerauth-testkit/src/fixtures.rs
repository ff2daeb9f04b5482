//! Test fixtures and helpers.
//!
//! RSA key generation is the slowest thing in any test run, so fixtures
//! draw from one process-wide pool of key pairs generated from fixed seeds.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa::RsaPrivateKey;

use ledgerauth::{AuthConfig, RequestBuilder, SecurityConfig, TransactionRequest};
use ledgerauth_core::{
    Address, AddressDeriver, Blake3AddressDeriver, Keypair, PrivateKey, DEFAULT_KEY_BITS,
};
use ledgerauth_perms::{AllowList, LedgerPermission, RoleRegistry, TransactionPermission};

/// Size of the shared key pool.
pub const POOL_SIZE: usize = 8;

/// Role granted to fixture endpoints by [`TestFixture::role_registry`].
pub const CLIENT_ROLE: &str = "client";

/// Role granted to fixture nodes by [`TestFixture::role_registry`].
pub const VALIDATOR_ROLE: &str = "validator";

/// Generate a key pair deterministically from `seed`.
///
/// # Panics
///
/// If `bits` is not a usable RSA modulus size.
pub fn seeded_keypair_with_bits(seed: u64, bits: usize) -> Keypair {
    let mut rng = StdRng::seed_from_u64(seed);
    let key = RsaPrivateKey::new(&mut rng, bits).expect("RSA key generation");
    let private = PrivateKey::from_rsa(key).expect("two-prime key");
    Keypair::from_private(private)
}

/// A 2048-bit key pair generated from `seed`.
pub fn seeded_keypair(seed: u64) -> Keypair {
    seeded_keypair_with_bits(seed, DEFAULT_KEY_BITS)
}

/// The shared pool, generated on first use.
pub fn shared_keypairs() -> &'static [Keypair] {
    static POOL: OnceLock<Vec<Keypair>> = OnceLock::new();
    POOL.get_or_init(|| (0..POOL_SIZE as u64).map(seeded_keypair).collect())
}

/// Address of `keypair` under the default deriver.
pub fn address_of(keypair: &Keypair) -> Address {
    Blake3AddressDeriver.derive(keypair.public_key())
}

/// A set of endpoints and nodes drawn from the shared pool.
///
/// Endpoints take the first keys of the pool and nodes the ones after, so
/// no key is both.
#[derive(Debug, Clone)]
pub struct TestFixture {
    pub endpoints: Vec<&'static Keypair>,
    pub nodes: Vec<&'static Keypair>,
}

impl TestFixture {
    /// # Panics
    ///
    /// If `endpoints + nodes` exceeds [`POOL_SIZE`].
    pub fn new(endpoints: usize, nodes: usize) -> Self {
        assert!(
            endpoints + nodes <= POOL_SIZE,
            "fixture needs {} keys, pool has {POOL_SIZE}",
            endpoints + nodes
        );
        let pool = shared_keypairs();
        Self {
            endpoints: pool[..endpoints].iter().collect(),
            nodes: pool[endpoints..endpoints + nodes].iter().collect(),
        }
    }

    /// One endpoint, one node.
    pub fn single() -> Self {
        Self::new(1, 1)
    }

    pub fn endpoint_addresses(&self) -> BTreeSet<Address> {
        self.endpoints.iter().map(|k| address_of(k)).collect()
    }

    pub fn node_addresses(&self) -> BTreeSet<Address> {
        self.nodes.iter().map(|k| address_of(k)).collect()
    }

    /// A request over `content` signed by every endpoint and node.
    pub fn request(&self, content: &[u8]) -> TransactionRequest {
        let builder = self
            .endpoints
            .iter()
            .fold(RequestBuilder::new(content.to_vec()), |b, k| b.endpoint(*k));
        self.nodes
            .iter()
            .fold(builder, |b, k| b.node(*k))
            .build()
            .expect("fixture signing")
    }

    /// Clients may submit operations and call contracts; validators may
    /// endorse and take part in consensus.
    pub fn role_registry(&self) -> RoleRegistry {
        let registry = RoleRegistry::new()
            .with_role(
                CLIENT_ROLE,
                [
                    TransactionPermission::DirectOperation.into(),
                    TransactionPermission::ContractOperation.into(),
                ],
            )
            .with_role(
                VALIDATOR_ROLE,
                [
                    LedgerPermission::ApproveTx.into(),
                    LedgerPermission::ConsensusTx.into(),
                ],
            );
        let registry = self
            .endpoint_addresses()
            .into_iter()
            .fold(registry, |r, a| r.with_endpoint(a, CLIENT_ROLE));
        self.node_addresses()
            .into_iter()
            .fold(registry, |r, a| r.with_node(a, VALIDATOR_ROLE))
    }

    pub fn allow_list(&self) -> AllowList {
        AllowList {
            endpoints: self.endpoint_addresses(),
            nodes: self.node_addresses(),
        }
    }

    pub fn role_based_config(&self) -> AuthConfig {
        AuthConfig {
            security: SecurityConfig::RoleBased(self.role_registry()),
            ..AuthConfig::default()
        }
    }

    pub fn allow_list_config(&self) -> AuthConfig {
        AuthConfig {
            security: SecurityConfig::AllowList(self.allow_list()),
            ..AuthConfig::default()
        }
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerauth::{Authenticator, MultiIdsPolicy, Requirement};

    #[test]
    fn test_seeded_keys_are_deterministic() {
        let a = seeded_keypair_with_bits(7, 1024);
        let b = seeded_keypair_with_bits(7, 1024);
        let c = seeded_keypair_with_bits(8, 1024);

        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), c.public_key());
        assert_eq!(a.public_key().bits(), 1024);
    }

    #[test]
    fn test_pool_keys_are_distinct() {
        let addresses: BTreeSet<_> = shared_keypairs().iter().map(address_of).collect();
        assert_eq!(addresses.len(), POOL_SIZE);
    }

    #[test]
    fn test_fixture_request_authorizes_under_roles() {
        let fixture = TestFixture::new(2, 2);
        let auth = Authenticator::new(&fixture.role_based_config()).unwrap();
        let requirement = Requirement::contract_operation()
            .endpoint_validity(MultiIdsPolicy::All)
            .node_validity(MultiIdsPolicy::All)
            .node_permission(LedgerPermission::ApproveTx, MultiIdsPolicy::All);

        let credentials = auth.authorize(&fixture.request(b"fixture"), &requirement).unwrap();
        assert_eq!(credentials.endpoint_addresses(), fixture.endpoint_addresses());
        assert_eq!(credentials.node_addresses(), fixture.node_addresses());
    }

    #[test]
    fn test_allow_list_fixture() {
        let fixture = TestFixture::single();
        let auth = Authenticator::new(&fixture.allow_list_config()).unwrap();
        auth.authorize(&fixture.request(b"listed"), &Requirement::direct_operation())
            .unwrap();

        let outsider = TestFixture::new(3, 1);
        // Endpoints of `outsider` include the listed node key.
        assert!(auth
            .authorize(
                &outsider.request(b"outsider"),
                &Requirement::new().endpoint_validity(MultiIdsPolicy::All)
            )
            .is_err());
    }

    #[test]
    #[should_panic(expected = "fixture needs")]
    fn test_oversized_fixture_panics() {
        TestFixture::new(POOL_SIZE, 1);
    }
}
