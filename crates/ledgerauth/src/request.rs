//! Transaction requests as they arrive for authentication.
//!
//! A request carries the transaction content, its Blake3 content hash, and
//! two signature lists: endpoints (the parties submitting the transaction)
//! and nodes (the peers endorsing it). Every signature is over the content
//! hash bytes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use ledgerauth_core::{ContentHash, Keypair, PublicKey};

use crate::error::{AuthError, Result};

/// One signer's public key (Raw encoding) and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature {
    pub public_key: Bytes,
    pub signature: Bytes,
}

impl DigitalSignature {
    pub fn new(public_key: impl Into<Bytes>, signature: impl Into<Bytes>) -> Self {
        Self {
            public_key: public_key.into(),
            signature: signature.into(),
        }
    }

    /// Sign `content_hash` with `keypair`.
    pub fn sign(keypair: &Keypair, content_hash: &ContentHash) -> Result<Self> {
        let signature = keypair.sign(content_hash.as_bytes())?;
        Ok(Self::new(
            keypair.public_key().to_raw(),
            signature.into_bytes(),
        ))
    }

    /// Decode the carried public key.
    pub fn decode_public_key(&self) -> Result<PublicKey> {
        Ok(PublicKey::from_raw(&self.public_key)?)
    }
}

/// A transaction submitted for authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub content_hash: ContentHash,
    pub content: Bytes,
    #[serde(default)]
    pub endpoint_signatures: Vec<DigitalSignature>,
    #[serde(default)]
    pub node_signatures: Vec<DigitalSignature>,
}

impl TransactionRequest {
    /// Whether `content_hash` matches the carried content.
    pub fn is_content_hash_valid(&self) -> bool {
        ContentHash::hash(&self.content) == self.content_hash
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf)
            .map_err(|e| AuthError::MalformedRequest(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| AuthError::MalformedRequest(e.to_string()))
    }
}

/// Builder for signed requests.
///
/// Hashes the content once and signs the hash with every added keypair.
#[derive(Debug)]
pub struct RequestBuilder<'a> {
    content: Bytes,
    endpoints: Vec<Signer<'a>>,
    nodes: Vec<Signer<'a>>,
}

#[derive(Debug)]
enum Signer<'a> {
    Key(&'a Keypair),
    Presigned(DigitalSignature),
}

impl<'a> RequestBuilder<'a> {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            endpoints: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Sign as an endpoint.
    pub fn endpoint(mut self, keypair: &'a Keypair) -> Self {
        self.endpoints.push(Signer::Key(keypair));
        self
    }

    /// Sign as a node.
    pub fn node(mut self, keypair: &'a Keypair) -> Self {
        self.nodes.push(Signer::Key(keypair));
        self
    }

    /// Append an endpoint signature as-is, without checking it.
    pub fn endpoint_signature(mut self, signature: DigitalSignature) -> Self {
        self.endpoints.push(Signer::Presigned(signature));
        self
    }

    pub fn node_signature(mut self, signature: DigitalSignature) -> Self {
        self.nodes.push(Signer::Presigned(signature));
        self
    }

    /// Hash the content and produce the signatures in insertion order.
    pub fn build(self) -> Result<TransactionRequest> {
        let content_hash = ContentHash::hash(&self.content);
        let endpoint_signatures = sign_all(self.endpoints, &content_hash)?;
        let node_signatures = sign_all(self.nodes, &content_hash)?;

        Ok(TransactionRequest {
            content_hash,
            content: self.content,
            endpoint_signatures,
            node_signatures,
        })
    }
}

fn sign_all(signers: Vec<Signer<'_>>, content_hash: &ContentHash) -> Result<Vec<DigitalSignature>> {
    signers
        .into_iter()
        .map(|signer| match signer {
            Signer::Key(keypair) => DigitalSignature::sign(keypair, content_hash),
            Signer::Presigned(signature) => Ok(signature),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{keypair, other_keypair};

    #[test]
    fn test_builder_hashes_and_signs() {
        let request = RequestBuilder::new(b"transfer 10".to_vec())
            .endpoint(keypair())
            .node(other_keypair())
            .build()
            .unwrap();

        assert!(request.is_content_hash_valid());
        assert_eq!(request.endpoint_signatures.len(), 1);
        assert_eq!(request.node_signatures.len(), 1);

        let endpoint = &request.endpoint_signatures[0];
        assert_eq!(&endpoint.public_key[..], keypair().public_key().to_raw().as_slice());
        assert!(keypair().public_key().verify(request.content_hash.as_bytes(), &endpoint.signature));
    }

    #[test]
    fn test_presigned_kept_in_order() {
        let junk = DigitalSignature::new(vec![1, 2, 3], vec![4]);
        let request = RequestBuilder::new(Bytes::from_static(b"x"))
            .endpoint(keypair())
            .endpoint_signature(junk.clone())
            .build()
            .unwrap();

        assert_eq!(request.endpoint_signatures[1], junk);
        assert!(request.node_signatures.is_empty());
    }

    #[test]
    fn test_tampered_content_detected() {
        let mut request = RequestBuilder::new(b"pay alice".to_vec())
            .endpoint(keypair())
            .build()
            .unwrap();
        request.content = Bytes::from_static(b"pay mallory");
        assert!(!request.is_content_hash_valid());
    }

    #[test]
    fn test_cbor_roundtrip() {
        let request = RequestBuilder::new(b"payload".to_vec())
            .endpoint(keypair())
            .endpoint(other_keypair())
            .node(keypair())
            .build()
            .unwrap();

        let bytes = request.to_bytes().unwrap();
        let recovered = TransactionRequest::from_bytes(&bytes).unwrap();
        assert_eq!(request, recovered);
    }

    #[test]
    fn test_garbage_rejected() {
        let err = TransactionRequest::from_bytes(&[0xa1, 0x00]).unwrap_err();
        assert!(matches!(err, AuthError::MalformedRequest(_)));
    }

    #[test]
    fn test_decode_public_key() {
        let signature = DigitalSignature::sign(keypair(), &ContentHash::hash(b"m")).unwrap();
        assert_eq!(&signature.decode_public_key().unwrap(), keypair().public_key());

        let bad = DigitalSignature::new(vec![0u8; 3], vec![]);
        assert!(matches!(bad.decode_public_key(), Err(AuthError::Core(_))));
    }
}
