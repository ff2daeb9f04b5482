//! Ciphertext geometry vectors for cross-implementation checks.
//!
//! Chunked encryption is randomized, so ciphertext bytes cannot be pinned.
//! What every implementation must agree on is the geometry: how many
//! blocks a plaintext of a given length occupies under a given modulus.

use serde::{Deserialize, Serialize};

use ledgerauth_core::{decrypt, encrypt, Keypair, PKCS1_PADDING_OVERHEAD};

/// Expected ciphertext length for one plaintext length and key size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkVector {
    pub name: String,
    pub key_bits: usize,
    pub plaintext_len: usize,
    pub ciphertext_len: usize,
}

impl ChunkVector {
    fn new(name: &str, key_bits: usize, plaintext_len: usize, blocks: usize) -> Self {
        Self {
            name: name.to_string(),
            key_bits,
            plaintext_len,
            ciphertext_len: blocks * key_bits / 8,
        }
    }
}

/// The vector set for 2048-bit keys.
pub fn all_vectors() -> Vec<ChunkVector> {
    let capacity = 2048 / 8 - PKCS1_PADDING_OVERHEAD;
    vec![
        ChunkVector::new("empty", 2048, 0, 1),
        ChunkVector::new("one_byte", 2048, 1, 1),
        ChunkVector::new("full_block", 2048, capacity, 1),
        ChunkVector::new("one_past_block", 2048, capacity + 1, 2),
        ChunkVector::new("two_full_blocks", 2048, 2 * capacity, 2),
        ChunkVector::new("kilobyte", 2048, 1024, 5),
    ]
}

/// Vectors as pretty JSON, for sharing with other implementations.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}

/// Encrypt and decrypt a plaintext for every vector matching the key size
/// of `keypair`, returning the names of vectors that did not hold.
pub fn verify_vectors(keypair: &Keypair) -> Vec<String> {
    let bits = keypair.public_key().bits();
    all_vectors()
        .into_iter()
        .filter(|v| v.key_bits == bits)
        .filter(|v| {
            let plaintext: Vec<u8> = (0..v.plaintext_len).map(|i| i as u8).collect();
            let Ok(ciphertext) = encrypt(&plaintext, keypair.public_key()) else {
                return true;
            };
            ciphertext.len() != v.ciphertext_len
                || decrypt(&ciphertext, keypair.private_key()).ok() != Some(plaintext)
        })
        .map(|v| v.name)
        .collect()
}
