//! Credential resolution.
//!
//! [`CredentialResolver`] turns the signature lists of a
//! [`TransactionRequest`] into a [`CredentialSet`]: one credential per
//! distinct signer address, keyed by address.
//!
//! A list with exactly one signature takes the fast path: its identity is
//! resolved through the shared [`IdentityCache`] and recorded as the single
//! signer. Any other list derives each identity independently, bypassing
//! the cache.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use ledgerauth_core::{
    verify, Address, BlockchainIdentity, ContentHash, IdentityCache, PublicKey, Signature,
};

use crate::error::{AuthError, Result};
use crate::request::{DigitalSignature, TransactionRequest};

/// Which signature list a signer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignerRole {
    Endpoint,
    Node,
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerRole::Endpoint => f.write_str("endpoint"),
            SignerRole::Node => f.write_str("node"),
        }
    }
}

/// What to do when two signatures in one list resolve to the same address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Fail with [`AuthError::DuplicateSigner`].
    #[default]
    Reject,
    /// Keep the later signature.
    LastWriteWins,
}

/// A resolved signer: identity plus the signature it supplied.
#[derive(Debug, Clone)]
pub struct Credential {
    identity: Arc<BlockchainIdentity>,
    signature: Signature,
}

impl Credential {
    pub fn new(identity: Arc<BlockchainIdentity>, signature: Signature) -> Self {
        Self {
            identity,
            signature,
        }
    }

    pub fn identity(&self) -> &Arc<BlockchainIdentity> {
        &self.identity
    }

    pub fn address(&self) -> &Address {
        self.identity.address()
    }

    pub fn public_key(&self) -> &PublicKey {
        self.identity.public_key()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether the signature verifies over `message` under this identity's key.
    pub fn verify(&self, message: &[u8]) -> bool {
        verify(message, self.public_key(), self.signature.as_bytes())
    }
}

/// The credentials of one request.
///
/// Built once by [`CredentialResolver::resolve`] and immutable afterwards.
#[derive(Debug, Clone)]
pub struct CredentialSet {
    content_hash: ContentHash,
    content: Bytes,
    endpoints: SignerGroup,
    nodes: SignerGroup,
    endpoint_signatures: Vec<DigitalSignature>,
    node_signatures: Vec<DigitalSignature>,
}

#[derive(Debug, Clone, Default)]
struct SignerGroup {
    by_address: BTreeMap<Address, Credential>,
    single: Option<Address>,
}

impl SignerGroup {
    fn single_credential(&self) -> Option<&Credential> {
        self.single.as_ref().and_then(|a| self.by_address.get(a))
    }

    fn addresses(&self) -> BTreeSet<Address> {
        self.by_address.keys().cloned().collect()
    }
}

impl CredentialSet {
    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn endpoint_addresses(&self) -> BTreeSet<Address> {
        self.endpoints.addresses()
    }

    pub fn node_addresses(&self) -> BTreeSet<Address> {
        self.nodes.addresses()
    }

    /// True when the request carried exactly one endpoint signature.
    pub fn is_single_endpoint_signature(&self) -> bool {
        self.endpoints.single.is_some()
    }

    pub fn is_single_node_signature(&self) -> bool {
        self.nodes.single.is_some()
    }

    pub fn single_endpoint(&self) -> Option<&Address> {
        self.endpoints.single.as_ref()
    }

    pub fn single_node(&self) -> Option<&Address> {
        self.nodes.single.as_ref()
    }

    pub fn single_endpoint_credential(&self) -> Option<&Credential> {
        self.endpoints.single_credential()
    }

    pub fn single_node_credential(&self) -> Option<&Credential> {
        self.nodes.single_credential()
    }

    /// Endpoint credentials in address order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Credential> + '_ {
        self.endpoints.by_address.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Credential> + '_ {
        self.nodes.by_address.values()
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.by_address.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.by_address.len()
    }

    pub fn contains_endpoint(&self, address: &Address) -> bool {
        self.endpoints.by_address.contains_key(address)
    }

    pub fn contains_node(&self, address: &Address) -> bool {
        self.nodes.by_address.contains_key(address)
    }

    pub fn endpoint(&self, address: &Address) -> Option<&Credential> {
        self.endpoints.by_address.get(address)
    }

    pub fn node(&self, address: &Address) -> Option<&Credential> {
        self.nodes.by_address.get(address)
    }

    pub fn endpoint_signature(&self, address: &Address) -> Option<&Signature> {
        self.endpoint(address).map(Credential::signature)
    }

    pub fn node_signature(&self, address: &Address) -> Option<&Signature> {
        self.node(address).map(Credential::signature)
    }

    /// Endpoint signatures exactly as carried by the request.
    pub fn endpoint_signatures(&self) -> &[DigitalSignature] {
        &self.endpoint_signatures
    }

    pub fn node_signatures(&self) -> &[DigitalSignature] {
        &self.node_signatures
    }

    /// Check every credential's signature over the content hash.
    ///
    /// Endpoints are checked before nodes; the first failure is returned.
    pub fn verify_signatures(&self) -> Result<()> {
        let message = self.content_hash.as_bytes();
        for credential in self.endpoints().chain(self.nodes()) {
            if !credential.verify(message) {
                tracing::warn!(address = %credential.address(), "signature verification failed");
                return Err(AuthError::InvalidSignature(credential.address().clone()));
            }
        }
        Ok(())
    }
}

/// Resolves request signature lists into credentials.
#[derive(Debug, Clone)]
pub struct CredentialResolver {
    cache: Arc<IdentityCache>,
    collision: CollisionPolicy,
}

impl CredentialResolver {
    pub fn new(cache: Arc<IdentityCache>, collision: CollisionPolicy) -> Self {
        Self { cache, collision }
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision
    }

    /// Resolve both signature lists of `request`.
    ///
    /// Fails if a public key cannot be decoded, or on a duplicate signer
    /// under [`CollisionPolicy::Reject`].
    pub fn resolve(&self, request: &TransactionRequest) -> Result<CredentialSet> {
        let endpoints = self.resolve_group(SignerRole::Endpoint, &request.endpoint_signatures)?;
        let nodes = self.resolve_group(SignerRole::Node, &request.node_signatures)?;

        tracing::debug!(
            endpoints = endpoints.by_address.len(),
            nodes = nodes.by_address.len(),
            single_endpoint = endpoints.single.is_some(),
            "resolved credentials"
        );

        Ok(CredentialSet {
            content_hash: request.content_hash,
            content: request.content.clone(),
            endpoints,
            nodes,
            endpoint_signatures: request.endpoint_signatures.clone(),
            node_signatures: request.node_signatures.clone(),
        })
    }

    fn resolve_group(&self, role: SignerRole, signatures: &[DigitalSignature]) -> Result<SignerGroup> {
        if let [only] = signatures {
            let public_key = only.decode_public_key()?;
            let identity = self.cache.get_identity(&public_key);
            let address = identity.address().clone();
            let credential = Credential::new(identity, Signature::from_bytes(only.signature.to_vec()));

            return Ok(SignerGroup {
                by_address: BTreeMap::from([(address.clone(), credential)]),
                single: Some(address),
            });
        }

        let mut by_address = BTreeMap::new();
        for entry in signatures {
            let public_key = entry.decode_public_key()?;
            let identity = Arc::new(self.cache.derive_identity(&public_key));
            let address = identity.address().clone();
            let credential = Credential::new(identity, Signature::from_bytes(entry.signature.to_vec()));

            if by_address.contains_key(&address) {
                tracing::warn!(%role, %address, policy = ?self.collision, "duplicate signer");
                if self.collision == CollisionPolicy::Reject {
                    return Err(AuthError::DuplicateSigner { role, address });
                }
            }
            by_address.insert(address, credential);
        }

        Ok(SignerGroup {
            by_address,
            single: None,
        })
    }
}
