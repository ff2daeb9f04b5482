//! RSA key types and their three byte encodings.
//!
//! Every key converts to and from:
//!
//! - [`KeyEncoding::Raw`]: the compact length-prefixed layout in [`crate::raw`]
//! - [`KeyEncoding::Pkcs1`]: DER `RSAPublicKey` / `RSAPrivateKey` (RFC 8017)
//! - [`KeyEncoding::Pkcs8`]: DER `SubjectPublicKeyInfo` / `PrivateKeyInfo`
//!
//! The encodings differ byte-wise but decode to equal key material.

use std::fmt;

use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::crypto::{self, Signature, PKCS1_PADDING_OVERHEAD};
use crate::error::{CoreError, Result};
use crate::raw::{self, PRIVATE_FIELDS, PUBLIC_FIELDS};

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Byte encoding of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEncoding {
    Raw,
    Pkcs1,
    Pkcs8,
}

impl KeyEncoding {
    /// All supported encodings.
    pub const ALL: [KeyEncoding; 3] = [KeyEncoding::Raw, KeyEncoding::Pkcs1, KeyEncoding::Pkcs8];
}

fn check_modulus_size(size: usize) -> Result<()> {
    if size <= PKCS1_PADDING_OVERHEAD {
        return Err(CoreError::format(format!(
            "modulus of {size} bytes is too small for PKCS#1 v1.5"
        )));
    }
    Ok(())
}

/// An RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Wrap an `rsa` public key.
    pub fn from_rsa(key: RsaPublicKey) -> Self {
        Self(key)
    }

    /// Borrow the underlying `rsa` key.
    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Modulus length in bytes. Signatures and ciphertext blocks have this length.
    pub fn size(&self) -> usize {
        self.0.size()
    }

    /// Modulus length in bits.
    pub fn bits(&self) -> usize {
        self.0.n().bits()
    }

    /// Maximum plaintext bytes carried by one ciphertext block.
    ///
    /// Zero for a modulus too small to hold PKCS#1 v1.5 padding.
    pub fn block_capacity(&self) -> usize {
        self.size().saturating_sub(PKCS1_PADDING_OVERHEAD)
    }

    /// Decoded keys must leave room for at least one plaintext byte per block.
    fn checked(key: RsaPublicKey) -> Result<Self> {
        check_modulus_size(key.size())?;
        Ok(Self(key))
    }

    /// Raw encoding: `n, e` as length-prefixed magnitudes.
    pub fn to_raw(&self) -> Vec<u8> {
        raw::write_fields(&[self.0.n(), self.0.e()])
    }

    /// Decode the Raw encoding.
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        let [n, e]: [BigUint; PUBLIC_FIELDS] = raw::read_fields(bytes, PUBLIC_FIELDS)?
            .try_into()
            .map_err(|_| CoreError::format("missing public key fields"))?;
        let key = RsaPublicKey::new(n, e)
            .map_err(|e| CoreError::format(format!("invalid public key: {e}")))?;
        Self::checked(key)
    }

    /// DER `RSAPublicKey`.
    pub fn to_pkcs1(&self) -> Result<Vec<u8>> {
        self.0
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CoreError::format(e.to_string()))
    }

    /// Decode a DER `RSAPublicKey`.
    pub fn from_pkcs1(bytes: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::from_pkcs1_der(bytes)
            .map_err(|e| CoreError::format(format!("invalid PKCS#1 public key: {e}")))?;
        Self::checked(key)
    }

    /// DER `SubjectPublicKeyInfo`.
    pub fn to_pkcs8(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CoreError::format(e.to_string()))
    }

    /// Decode a DER `SubjectPublicKeyInfo`.
    pub fn from_pkcs8(bytes: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::from_public_key_der(bytes)
            .map_err(|e| CoreError::format(format!("invalid PKCS#8 public key: {e}")))?;
        Self::checked(key)
    }

    /// Encode with the given encoding.
    pub fn encode(&self, encoding: KeyEncoding) -> Result<Vec<u8>> {
        match encoding {
            KeyEncoding::Raw => Ok(self.to_raw()),
            KeyEncoding::Pkcs1 => self.to_pkcs1(),
            KeyEncoding::Pkcs8 => self.to_pkcs8(),
        }
    }

    /// Decode from the given encoding.
    pub fn decode(bytes: &[u8], encoding: KeyEncoding) -> Result<Self> {
        match encoding {
            KeyEncoding::Raw => Self::from_raw(bytes),
            KeyEncoding::Pkcs1 => Self::from_pkcs1(bytes),
            KeyEncoding::Pkcs8 => Self::from_pkcs8(bytes),
        }
    }

    /// Verify a signature over `message`. See [`crypto::verify`].
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        crypto::verify(message, self, signature)
    }

    /// Short fingerprint for logs: first 8 bytes of Blake3 over the Raw encoding.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(&self.to_raw()).as_bytes()[..8])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPub({}, {})", self.bits(), self.fingerprint())
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

/// An RSA private key with its CRT parameters.
///
/// Only two-prime keys are accepted. The CRT values are computed once at
/// construction so every encoding can emit them.
#[derive(Clone, PartialEq)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
    dp: BigUint,
    dq: BigUint,
    qinv: BigUint,
}

impl PrivateKey {
    /// Wrap an `rsa` private key, precomputing its CRT values.
    pub fn from_rsa(mut key: RsaPrivateKey) -> Result<Self> {
        check_modulus_size(key.size())?;
        if key.primes().len() != 2 {
            return Err(CoreError::format(format!(
                "expected 2 primes, found {}",
                key.primes().len()
            )));
        }
        key.precompute()
            .map_err(|e| CoreError::format(format!("CRT precomputation failed: {e}")))?;

        let dp = key.dp().cloned();
        let dq = key.dq().cloned();
        let qinv = key.crt_coefficient();
        match (dp, dq, qinv) {
            (Some(dp), Some(dq), Some(qinv)) => Ok(Self {
                inner: key,
                dp,
                dq,
                qinv,
            }),
            _ => Err(CoreError::format("missing CRT parameters")),
        }
    }

    pub fn as_rsa(&self) -> &RsaPrivateKey {
        &self.inner
    }

    /// Modulus length in bytes.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    /// Derive the public half.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.inner.to_public_key())
    }

    /// Raw encoding: `n, e, d, p, q, dP, dQ, qInv`.
    pub fn to_raw(&self) -> Vec<u8> {
        let primes = self.inner.primes();
        raw::write_fields(&[
            self.inner.n(),
            self.inner.e(),
            self.inner.d(),
            &primes[0],
            &primes[1],
            &self.dp,
            &self.dq,
            &self.qinv,
        ])
    }

    /// Decode a Raw private key.
    ///
    /// The stored CRT values must match the ones derived from `d`, `p`, `q`.
    pub fn from_raw(bytes: &[u8]) -> Result<Self> {
        let fields = raw::read_fields(bytes, PRIVATE_FIELDS)?;
        let [n, e, d, p, q, dp, dq, qinv]: [BigUint; PRIVATE_FIELDS] = fields
            .try_into()
            .map_err(|_| CoreError::format("missing private key fields"))?;

        let key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CoreError::format(format!("invalid private key: {e}")))?;
        let key = Self::from_rsa(key)?;

        if key.dp != dp || key.dq != dq || key.qinv != qinv {
            return Err(CoreError::format("inconsistent CRT parameters"));
        }
        Ok(key)
    }

    /// DER `RSAPrivateKey`.
    pub fn to_pkcs1(&self) -> Result<Vec<u8>> {
        self.inner
            .to_pkcs1_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CoreError::format(e.to_string()))
    }

    /// Decode a DER `RSAPrivateKey`.
    pub fn from_pkcs1(bytes: &[u8]) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs1_der(bytes)
            .map_err(|e| CoreError::format(format!("invalid PKCS#1 private key: {e}")))?;
        Self::from_rsa(key)
    }

    /// DER `PrivateKeyInfo`.
    pub fn to_pkcs8(&self) -> Result<Vec<u8>> {
        self.inner
            .to_pkcs8_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CoreError::format(e.to_string()))
    }

    /// Decode a DER `PrivateKeyInfo`.
    pub fn from_pkcs8(bytes: &[u8]) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_der(bytes)
            .map_err(|e| CoreError::format(format!("invalid PKCS#8 private key: {e}")))?;
        Self::from_rsa(key)
    }

    pub fn encode(&self, encoding: KeyEncoding) -> Result<Vec<u8>> {
        match encoding {
            KeyEncoding::Raw => Ok(self.to_raw()),
            KeyEncoding::Pkcs1 => self.to_pkcs1(),
            KeyEncoding::Pkcs8 => self.to_pkcs8(),
        }
    }

    pub fn decode(bytes: &[u8], encoding: KeyEncoding) -> Result<Self> {
        match encoding {
            KeyEncoding::Raw => Self::from_raw(bytes),
            KeyEncoding::Pkcs1 => Self::from_pkcs1(bytes),
            KeyEncoding::Pkcs8 => Self::from_pkcs8(bytes),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RsaPriv({}, {})", self.bits(), self.public_key().fingerprint())
    }
}

/// Either half of an RSA key pair.
#[derive(Debug, Clone, PartialEq)]
pub enum AsymmetricKey {
    Public(PublicKey),
    Private(PrivateKey),
}

impl AsymmetricKey {
    pub fn encode(&self, encoding: KeyEncoding) -> Result<Vec<u8>> {
        match self {
            AsymmetricKey::Public(key) => key.encode(encoding),
            AsymmetricKey::Private(key) => key.encode(encoding),
        }
    }

    pub fn decode_public(bytes: &[u8], encoding: KeyEncoding) -> Result<Self> {
        PublicKey::decode(bytes, encoding).map(AsymmetricKey::Public)
    }

    pub fn decode_private(bytes: &[u8], encoding: KeyEncoding) -> Result<Self> {
        PrivateKey::decode(bytes, encoding).map(AsymmetricKey::Private)
    }

    /// The public key, derived when this is a private key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            AsymmetricKey::Public(key) => key.clone(),
            AsymmetricKey::Private(key) => key.public_key(),
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, AsymmetricKey::Private(_))
    }
}

impl From<PublicKey> for AsymmetricKey {
    fn from(key: PublicKey) -> Self {
        AsymmetricKey::Public(key)
    }
}

impl From<PrivateKey> for AsymmetricKey {
    fn from(key: PrivateKey) -> Self {
        AsymmetricKey::Private(key)
    }
}

/// Rebuild the Raw public encoding from a Raw private encoding.
pub fn retrieve_public_key(private_raw: &[u8]) -> Result<Vec<u8>> {
    Ok(PrivateKey::from_raw(private_raw)?.public_key().to_raw())
}

/// An RSA key pair used to sign requests.
#[derive(Clone)]
pub struct Keypair {
    private: PrivateKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a fresh key pair with a [`DEFAULT_KEY_BITS`] modulus.
    pub fn generate() -> Result<Self> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    /// Generate a fresh key pair with the given modulus size.
    pub fn generate_with_bits(bits: usize) -> Result<Self> {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;
        Ok(Self::from_private(PrivateKey::from_rsa(key)?))
    }

    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Sign a message with the private half.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        crypto::sign(message, &self.private)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public)
    }
}
