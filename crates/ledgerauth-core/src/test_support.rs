//! Shared key pairs for unit tests.
//!
//! RSA key generation is slow, so each test binary generates a handful of
//! keys once and reuses them.

use std::sync::OnceLock;

use crate::keys::Keypair;

const KEY_COUNT: usize = 4;

pub(crate) fn keypairs() -> &'static [Keypair] {
    static KEYS: OnceLock<Vec<Keypair>> = OnceLock::new();
    KEYS.get_or_init(|| {
        (0..KEY_COUNT)
            .map(|_| Keypair::generate().expect("key generation"))
            .collect()
    })
}

pub(crate) fn keypair() -> &'static Keypair {
    &keypairs()[0]
}

pub(crate) fn other_keypair() -> &'static Keypair {
    &keypairs()[1]
}
