//! Cryptographic primitives for ledgerauth.
//!
//! RSA PKCS#1 v1.5 signatures over SHA-256, PKCS#1 v1.5 encryption chunked
//! to arbitrary payload lengths, and Blake3 content hashing.

use std::fmt;

use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, Result};
use crate::keys::{PrivateKey, PublicKey};

/// Bytes of PKCS#1 v1.5 encryption padding in every block.
pub const PKCS1_PADDING_OVERHEAD: usize = 11;

/// A 32-byte Blake3 digest of transaction content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ContentHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// An RSA signature. Its length equals the signer's modulus length.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "RsaSig({}...)", &hex[..hex.len().min(16)])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Sign `message`: SHA-256 digest, PKCS#1 v1.5 padding, CRT exponentiation.
///
/// Deterministic: the same key and message always give the same signature.
pub fn sign(message: &[u8], key: &PrivateKey) -> Result<Signature> {
    let digest = Sha256::digest(message);
    key.as_rsa()
        .sign(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice())
        .map(Signature)
        .map_err(|e| CoreError::Crypto(e.to_string()))
}

/// Sign with a Raw-encoded private key.
pub fn sign_raw(message: &[u8], private_raw: &[u8]) -> Result<Signature> {
    sign(message, &PrivateKey::from_raw(private_raw)?)
}

/// Verify a signature over `message`.
///
/// Returns `false` on any mismatch, including a wrong-length signature.
pub fn verify(message: &[u8], key: &PublicKey, signature: &[u8]) -> bool {
    if signature.len() != key.size() {
        return false;
    }
    let digest = Sha256::digest(message);
    key.as_rsa()
        .verify(Pkcs1v15Sign::new::<Sha256>(), digest.as_slice(), signature)
        .is_ok()
}

/// Verify with a Raw-encoded public key.
///
/// Errors only when the key bytes are malformed.
pub fn verify_raw(message: &[u8], public_raw: &[u8], signature: &[u8]) -> Result<bool> {
    Ok(verify(message, &PublicKey::from_raw(public_raw)?, signature))
}

/// Encrypt a single block.
///
/// Fails with [`CoreError::PayloadTooLarge`] above [`PublicKey::block_capacity`].
pub fn encrypt_block(plaintext: &[u8], key: &PublicKey) -> Result<Vec<u8>> {
    encrypt_block_with(&mut rand::thread_rng(), plaintext, key)
}

fn encrypt_block_with(
    rng: &mut rand::rngs::ThreadRng,
    plaintext: &[u8],
    key: &PublicKey,
) -> Result<Vec<u8>> {
    let max = key.block_capacity();
    if plaintext.len() > max {
        return Err(CoreError::PayloadTooLarge {
            len: plaintext.len(),
            max,
        });
    }
    key.as_rsa()
        .encrypt(rng, Pkcs1v15Encrypt, plaintext)
        .map_err(|e| CoreError::Crypto(e.to_string()))
}

/// Encrypt a payload of any length.
///
/// The plaintext is split into [`PublicKey::block_capacity`]-sized chunks and
/// each chunk becomes one modulus-length block. An empty payload still
/// produces one block.
pub fn encrypt(plaintext: &[u8], key: &PublicKey) -> Result<Vec<u8>> {
    let capacity = key.block_capacity();
    if capacity == 0 {
        return Err(CoreError::format(format!(
            "modulus of {} bytes cannot carry PKCS#1 v1.5 blocks",
            key.size()
        )));
    }

    let mut rng = rand::thread_rng();
    if plaintext.is_empty() {
        return encrypt_block_with(&mut rng, plaintext, key);
    }

    let blocks = plaintext.len().div_ceil(capacity);
    let mut out = Vec::with_capacity(blocks * key.size());
    for chunk in plaintext.chunks(capacity) {
        out.extend_from_slice(&encrypt_block_with(&mut rng, chunk, key)?);
    }
    Ok(out)
}

/// Encrypt with a Raw-encoded public key.
pub fn encrypt_raw(plaintext: &[u8], public_raw: &[u8]) -> Result<Vec<u8>> {
    encrypt(plaintext, &PublicKey::from_raw(public_raw)?)
}

/// Decrypt the output of [`encrypt`].
///
/// A length that is not a whole number of blocks, a bad padding, or any
/// other failure all produce the same [`CoreError::Padding`]. Each block is
/// decrypted with blinding.
pub fn decrypt(ciphertext: &[u8], key: &PrivateKey) -> Result<Vec<u8>> {
    let block = key.size();
    if ciphertext.is_empty() || ciphertext.len() % block != 0 {
        return Err(CoreError::Padding);
    }

    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(ciphertext.len());
    for chunk in ciphertext.chunks(block) {
        let plain = key
            .as_rsa()
            .decrypt_blinded(&mut rng, Pkcs1v15Encrypt, chunk)
            .map_err(|_| CoreError::Padding)?;
        out.extend_from_slice(&plain);
    }
    Ok(out)
}

/// Decrypt with a Raw-encoded private key.
pub fn decrypt_raw(ciphertext: &[u8], private_raw: &[u8]) -> Result<Vec<u8>> {
    decrypt(ciphertext, &PrivateKey::from_raw(private_raw)?)
}
