//! Shared key pairs for unit tests.

use std::sync::OnceLock;

use ledgerauth_core::Keypair;

pub(crate) fn keypairs() -> &'static [Keypair] {
    static KEYS: OnceLock<Vec<Keypair>> = OnceLock::new();
    KEYS.get_or_init(|| {
        (0..4)
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

pub(crate) fn third_keypair() -> &'static Keypair {
    &keypairs()[2]
}
