//! Raw key layout.
//!
//! A Raw encoding is a flat sequence of fields. Each field is a 2-byte
//! big-endian length followed by the unsigned big-endian magnitude of one
//! key component, without leading zero bytes.
//!
//! ```text
//! public:  n | e
//! private: n | e | d | p | q | dP | dQ | qInv
//! ```
//!
//! The layout carries no tag: callers know which kind of key they expect.

use rsa::BigUint;

use crate::error::{CoreError, Result};

/// Number of fields in a Raw public key.
pub const PUBLIC_FIELDS: usize = 2;

/// Number of fields in a Raw private key.
pub const PRIVATE_FIELDS: usize = 8;

const LENGTH_PREFIX: usize = 2;

/// Write the given components in Raw layout.
pub(crate) fn write_fields(fields: &[&BigUint]) -> Vec<u8> {
    let magnitudes: Vec<Vec<u8>> = fields.iter().map(|f| f.to_bytes_be()).collect();

    let mut out = Vec::with_capacity(
        magnitudes
            .iter()
            .map(|m| LENGTH_PREFIX + m.len())
            .sum(),
    );
    for magnitude in &magnitudes {
        // Components of keys accepted by the rsa crate stay far below 64 KiB.
        debug_assert!(magnitude.len() <= u16::MAX as usize);
        out.extend_from_slice(&(magnitude.len() as u16).to_be_bytes());
        out.extend_from_slice(magnitude);
    }
    out
}

/// Read exactly `count` components from `bytes`.
///
/// Fails on a truncated prefix or body, an empty field, or trailing bytes.
pub(crate) fn read_fields(bytes: &[u8], count: usize) -> Result<Vec<BigUint>> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = bytes;

    for index in 0..count {
        if rest.len() < LENGTH_PREFIX {
            return Err(CoreError::format(format!(
                "truncated length prefix for field {index}"
            )));
        }
        let len = u16::from_be_bytes([rest[0], rest[1]]) as usize;
        rest = &rest[LENGTH_PREFIX..];

        if len == 0 {
            return Err(CoreError::format(format!("field {index} is empty")));
        }
        if rest.len() < len {
            return Err(CoreError::format(format!(
                "field {index} truncated: need {len} bytes, have {}",
                rest.len()
            )));
        }

        let (field, tail) = rest.split_at(len);
        fields.push(BigUint::from_bytes_be(field));
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(CoreError::format(format!(
            "{} trailing bytes after {count} fields",
            rest.len()
        )));
    }

    Ok(fields)
}
