//! Signed attribute domain types.

use std::fmt;

use der::asn1::ObjectIdentifier;

use crate::domain::{constants, der_writer};

/// One CMS `Attribute`: `SEQUENCE { attrType OID, attrValues SET OF value }`.
///
/// Only single-valued attributes are produced by this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAttribute {
    oid: ObjectIdentifier,
    value_der: Vec<u8>,
    der: Vec<u8>, // complete Attribute SEQUENCE
}

impl SignedAttribute {
    /// Wrap an already DER-encoded value into an attribute of type `oid`.
    #[must_use]
    pub fn new(oid: ObjectIdentifier, value_der: Vec<u8>) -> Self {
        let der = der_writer::sequence(&[
            &der_writer::oid(&oid),
            &der_writer::set(&[&value_der]),
        ]);
        Self {
            oid,
            value_der,
            der,
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        self.oid
    }

    /// DER of the single attribute value (the element inside the SET).
    #[must_use]
    pub fn value_der(&self) -> &[u8] {
        &self.value_der
    }

    /// DER of the complete attribute SEQUENCE.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

impl fmt::Debug for SignedAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedAttribute(oid={}, len={})",
            self.oid,
            self.der.len()
        )
    }
}

/// The `signedAttrs` of one `SignerInfo`, held in DER SET order.
///
/// Built fresh for every signature; the signing time inside it must never
/// be reused across calls.
pub struct SignedAttributeSet {
    ordered: Vec<SignedAttribute>,
    concatenated_der: Vec<u8>, // concatenation of attribute DER sequences
}

impl SignedAttributeSet {
    #[must_use]
    pub fn new(mut attrs: Vec<SignedAttribute>) -> Self {
        attrs.sort_by(|a, b| a.der.cmp(&b.der)); // DER SET OF ordering
        let concatenated_der = attrs.iter().flat_map(|a| a.der.iter().copied()).collect();
        Self {
            ordered: attrs,
            concatenated_der,
        }
    }

    #[must_use]
    pub fn ordered(&self) -> &[SignedAttribute] {
        &self.ordered
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Look up an attribute by type.
    #[must_use]
    pub fn get(&self, oid: &ObjectIdentifier) -> Option<&SignedAttribute> {
        self.ordered.iter().find(|a| &a.oid == oid)
    }

    /// `SET OF Attribute` encoding. This is what the signature covers
    /// (RFC 5652 §5.4: the IMPLICIT [0] tag is replaced by the SET tag).
    #[must_use]
    pub fn to_signing_der(&self) -> Vec<u8> {
        der_writer::tlv(constants::ASN1_SET_TAG, &self.concatenated_der)
    }

    /// `[0] IMPLICIT` encoding used inside `SignerInfo`.
    #[must_use]
    pub fn to_embedded_der(&self) -> Vec<u8> {
        der_writer::tlv(constants::ASN1_CONTEXT_0_TAG, &self.concatenated_der)
    }
}

impl fmt::Debug for SignedAttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignedAttributeSet(count={}, total_len={})",
            self.ordered.len(),
            self.concatenated_der.len()
        )
    }
}
