//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ledgerauth::{RequestBuilder, TransactionRequest};
use ledgerauth_core::{Address, KeyEncoding, Keypair};
use ledgerauth_perms::{all_permissions, MultiIdsPolicy, Permission};

use crate::fixtures::{shared_keypairs, POOL_SIZE};

/// A key pair from the shared pool.
pub fn keypair() -> impl Strategy<Value = &'static Keypair> {
    (0..POOL_SIZE).prop_map(|i| &shared_keypairs()[i])
}

/// Payload bytes of at most `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

pub fn key_encoding() -> impl Strategy<Value = KeyEncoding> {
    prop::sample::select(KeyEncoding::ALL.to_vec())
}

pub fn permission() -> impl Strategy<Value = Permission> {
    prop::sample::select(all_permissions().into_iter().collect::<Vec<_>>())
}

pub fn multi_ids_policy() -> impl Strategy<Value = MultiIdsPolicy> {
    prop_oneof![Just(MultiIdsPolicy::AtLeastOne), Just(MultiIdsPolicy::All)]
}

/// Arbitrary short addresses, not derived from any key.
pub fn address() -> impl Strategy<Value = Address> {
    prop::collection::vec(any::<u8>(), 1..=21).prop_map(Address::from_bytes)
}

/// Parameters for generating a signed request.
///
/// Signers are indices into the shared pool and may repeat.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub content: Vec<u8>,
    pub endpoints: Vec<usize>,
    pub nodes: Vec<usize>,
}

impl Arbitrary for RequestParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            payload(512),
            prop::collection::vec(0..POOL_SIZE, 0..4),
            prop::collection::vec(0..POOL_SIZE, 0..4),
        )
            .prop_map(|(content, endpoints, nodes)| RequestParams {
                content,
                endpoints,
                nodes,
            })
            .boxed()
    }
}

/// Build and sign the request described by `params`.
pub fn request_from_params(params: &RequestParams) -> TransactionRequest {
    let pool = shared_keypairs();
    let builder = params
        .endpoints
        .iter()
        .fold(RequestBuilder::new(params.content.clone()), |b, &i| {
            b.endpoint(&pool[i])
        });
    params
        .nodes
        .iter()
        .fold(builder, |b, &i| b.node(&pool[i]))
        .build()
        .expect("pool keys sign")
}
