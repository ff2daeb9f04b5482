//! Addresses and blockchain identities.
//!
//! An [`Address`] is a one-way function of a public key. The function is
//! injected through [`AddressDeriver`] so deployments can match whatever
//! scheme their ledger uses.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::keys::PublicKey;

/// Opaque participant address derived from a public key.
///
/// Serializes as a hex string in human-readable formats and as a byte
/// string otherwise.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Bytes);

impl Address {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(s).map(Self::from_bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Address({})", &hex[..hex.len().min(16)])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            Bytes::deserialize(deserializer).map(Address)
        }
    }
}

/// Derives the address of a public key.
///
/// Implementations must be deterministic.
pub trait AddressDeriver: Send + Sync {
    fn derive(&self, public_key: &PublicKey) -> Address;
}

impl<F> AddressDeriver for F
where
    F: Fn(&PublicKey) -> Address + Send + Sync,
{
    fn derive(&self, public_key: &PublicKey) -> Address {
        self(public_key)
    }
}

/// Version byte prefixed to addresses from [`Blake3AddressDeriver`].
pub const ADDRESS_VERSION: u8 = 0x01;

/// Digest bytes kept after the version byte.
pub const ADDRESS_DIGEST_LEN: usize = 20;

/// Default deriver: `version || blake3_derive_key(raw_public_key)[..20]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3AddressDeriver;

impl AddressDeriver for Blake3AddressDeriver {
    fn derive(&self, public_key: &PublicKey) -> Address {
        let mut hasher = blake3::Hasher::new_derive_key("ledgerauth-v0-address");
        hasher.update(&public_key.to_raw());
        let digest = hasher.finalize();

        let mut out = Vec::with_capacity(1 + ADDRESS_DIGEST_LEN);
        out.push(ADDRESS_VERSION);
        out.extend_from_slice(&digest.as_bytes()[..ADDRESS_DIGEST_LEN]);
        Address::from_bytes(out)
    }
}

/// A participant identity: an address and the key it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainIdentity {
    address: Address,
    public_key: PublicKey,
}

impl BlockchainIdentity {
    pub fn new(address: Address, public_key: PublicKey) -> Self {
        Self {
            address,
            public_key,
        }
    }

    /// Derive an identity with the given deriver.
    pub fn derive(public_key: &PublicKey, deriver: &dyn AddressDeriver) -> Self {
        Self::new(deriver.derive(public_key), public_key.clone())
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}
