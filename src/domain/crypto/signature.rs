use std::fmt;

use der::asn1::ObjectIdentifier;

use super::DigestAlgorithm;
use crate::domain::constants;

/// Signature algorithms a key provider may be asked to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Sha256WithRsa,
}

impl SignatureAlgorithm {
    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Sha256WithRsa => constants::OID_SHA256_WITH_RSA,
        }
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        match self {
            SignatureAlgorithm::Sha256WithRsa => DigestAlgorithm::Sha256,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256WithRsa => "SHA256withRSA",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw signature value produced by a key provider.
#[derive(Clone, Eq, PartialEq)]
pub struct CmsSignature {
    algo: SignatureAlgorithm,
    bytes: Box<[u8]>,
}

impl CmsSignature {
    #[must_use]
    pub fn new(algo: SignatureAlgorithm, bytes: Vec<u8>) -> Self {
        Self {
            algo,
            bytes: bytes.into_boxed_slice(),
        }
    }
    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algo
    }
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for CmsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CmsSignature(algo={:?}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}
