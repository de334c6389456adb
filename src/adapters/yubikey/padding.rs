//! RSASSA-PKCS1-v1_5 encoding for tokens that only offer raw RSA.

use crate::domain::crypto::DigestBytes;
use crate::domain::der_writer;

/// `DigestInfo ::= SEQUENCE { digestAlgorithm AlgorithmIdentifier, digest OCTET STRING }`
#[must_use]
pub fn digest_info(digest: &DigestBytes) -> Vec<u8> {
    der_writer::sequence(&[
        &der_writer::algorithm_identifier_null_params(&digest.algorithm().oid()),
        &der_writer::octet_string(digest.as_slice()),
    ])
}

/// EMSA-PKCS1-v1_5 block: `00 01 FF..FF 00 || T` padded to `modulus_len`.
///
/// Returns `None` when `t` does not leave room for eight bytes of padding.
#[must_use]
pub fn pkcs1_v15_pad(t: &[u8], modulus_len: usize) -> Option<Vec<u8>> {
    if t.len() + 11 > modulus_len {
        return None;
    }
    let mut block = Vec::with_capacity(modulus_len);
    block.extend_from_slice(&[0x00, 0x01]);
    block.resize(modulus_len - t.len() - 1, 0xFF);
    block.push(0x00);
    block.extend_from_slice(t);
    Some(block)
}
