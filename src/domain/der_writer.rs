//! Minimal DER TLV writer used to assemble CMS structures.
//!
//! Element values (OIDs, times, certificates) come from the `der` and
//! `x509-cert` crates; this module only frames them with tags and lengths.

use der::asn1::ObjectIdentifier;

use super::constants;

/// Encode a DER definite length (short form below 128, long form otherwise).
#[must_use]
pub fn encode_len(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = len.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
    let significant = &bytes[first..];
    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Append `tag || len || value` to `buf`.
pub fn write_tlv(buf: &mut Vec<u8>, tag: u8, value: &[u8]) {
    buf.push(tag);
    buf.extend_from_slice(&encode_len(value.len()));
    buf.extend_from_slice(value);
}

/// Return a fresh `tag || len || value` buffer.
#[must_use]
pub fn tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 6);
    write_tlv(&mut out, tag, value);
    out
}

/// Concatenate already-encoded parts and wrap them in a SEQUENCE.
#[must_use]
pub fn sequence(parts: &[&[u8]]) -> Vec<u8> {
    tlv(constants::ASN1_SEQUENCE_TAG, &parts.concat())
}

/// Concatenate already-encoded parts and wrap them in a SET.
///
/// Callers are responsible for DER SET ordering when more than one element is present.
#[must_use]
pub fn set(parts: &[&[u8]]) -> Vec<u8> {
    tlv(constants::ASN1_SET_TAG, &parts.concat())
}

/// OBJECT IDENTIFIER TLV.
#[must_use]
pub fn oid(oid: &ObjectIdentifier) -> Vec<u8> {
    tlv(constants::ASN1_OID_TAG, oid.as_bytes())
}

/// OCTET STRING TLV.
#[must_use]
pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
    tlv(constants::ASN1_OCTET_STRING_TAG, bytes)
}

/// INTEGER TLV for a small non-negative value (CMS versions).
#[must_use]
pub fn small_integer(value: u8) -> Vec<u8> {
    if value & 0x80 != 0 {
        tlv(constants::ASN1_INTEGER_TAG, &[0x00, value])
    } else {
        tlv(constants::ASN1_INTEGER_TAG, &[value])
    }
}

/// `AlgorithmIdentifier` with absent parameters (SHA-2 digests, RFC 5754).
#[must_use]
pub fn algorithm_identifier(algorithm: &ObjectIdentifier) -> Vec<u8> {
    sequence(&[&oid(algorithm)])
}

/// `AlgorithmIdentifier` with NULL parameters (RSA signature algorithms, RFC 4055).
#[must_use]
pub fn algorithm_identifier_null_params(algorithm: &ObjectIdentifier) -> Vec<u8> {
    sequence(&[&oid(algorithm), constants::ASN1_NULL])
}
