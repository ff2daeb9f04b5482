//! Memoized public key to identity resolution.
//!
//! The cache is an explicit object. Whoever assembles the runtime owns it
//! and hands out `Arc` handles; nothing here is global.
//!
//! Entries are spread over independently locked shards keyed by the Raw
//! public key encoding, so lookups of unrelated keys rarely contend.
//! Concurrent first lookups of one key may each derive an identity, but only
//! the first insert is retained and every caller gets that instance back.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::identity::{AddressDeriver, BlockchainIdentity};
use crate::keys::PublicKey;

const SHARD_COUNT: usize = 16;

/// Capacity policy for an [`IdentityCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep every identity for the life of the process.
    ///
    /// Suitable for a bounded, permissioned participant set.
    #[default]
    Unbounded,

    /// Keep at most roughly `max_entries` identities.
    ///
    /// The limit is split evenly across shards; a full shard drops an
    /// arbitrary entry before inserting.
    Bounded { max_entries: usize },
}

/// Counters reported by [`IdentityCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

type Shard = RwLock<HashMap<Vec<u8>, Arc<BlockchainIdentity>>>;

/// Process-wide identity cache.
pub struct IdentityCache {
    deriver: Arc<dyn AddressDeriver>,
    policy: CachePolicy,
    shards: Box<[Shard]>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IdentityCache {
    pub fn new(deriver: Arc<dyn AddressDeriver>, policy: CachePolicy) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            deriver,
            policy,
            shards,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn unbounded(deriver: Arc<dyn AddressDeriver>) -> Self {
        Self::new(deriver, CachePolicy::Unbounded)
    }

    pub fn deriver(&self) -> &Arc<dyn AddressDeriver> {
        &self.deriver
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Resolve the identity for `public_key`, deriving and storing it on
    /// first use.
    pub fn get_identity(&self, public_key: &PublicKey) -> Arc<BlockchainIdentity> {
        let key = public_key.to_raw();
        let shard = self.shard_for(&key);

        if let Some(found) = shard.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(found);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        // Derive outside the lock; the address function may be expensive.
        let computed = Arc::new(self.derive_identity(public_key));

        let mut entries = shard.write();
        if let Some(existing) = entries.get(&key) {
            return Arc::clone(existing);
        }
        self.make_room(&mut entries);
        tracing::trace!(
            key = %public_key.fingerprint(),
            address = %computed.address(),
            "identity cached"
        );
        entries.insert(key, Arc::clone(&computed));
        computed
    }

    /// Derive an identity without touching the cache.
    pub fn derive_identity(&self, public_key: &PublicKey) -> BlockchainIdentity {
        BlockchainIdentity::derive(public_key, self.deriver.as_ref())
    }

    /// Whether an identity for `public_key` is currently retained.
    pub fn contains(&self, public_key: &PublicKey) -> bool {
        let key = public_key.to_raw();
        self.shard_for(&key).read().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn shard_for(&self, key: &[u8]) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    fn make_room(&self, entries: &mut HashMap<Vec<u8>, Arc<BlockchainIdentity>>) {
        let CachePolicy::Bounded { max_entries } = self.policy else {
            return;
        };
        let per_shard = max_entries.div_ceil(self.shards.len()).max(1);
        while entries.len() >= per_shard {
            let Some(victim) = entries.keys().next().cloned() else {
                break;
            };
            entries.remove(&victim);
            tracing::trace!(per_shard, "identity evicted");
        }
    }
}

impl fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCache")
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish()
    }
}
