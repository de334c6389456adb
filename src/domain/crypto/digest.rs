//! Digest algorithm domain type.
//!
//! The signing profile only admits SHA-256; the enum exists so that
//! configured algorithm names are validated in one place and so the OID and
//! output size travel with the algorithm.

use std::fmt;
use std::str::FromStr;

use der::asn1::ObjectIdentifier;
use sha2::{Digest, Sha256};

use crate::domain::constants;
use crate::infra::error::SigningError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 32,
        }
    }

    #[must_use]
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha256 => constants::OID_SHA256,
        }
    }

    /// Hash `data` with this algorithm.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> DigestBytes {
        let bytes = match self {
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        };
        DigestBytes {
            algo: *self,
            bytes: bytes.into_boxed_slice(),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(SigningError::DigestAlgorithmUnavailable(format!(
                "'{other}' is not available; only sha256 is supported"
            ))),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digest bytes paired with the algorithm that produced them.
///
/// Invariant: `bytes.len() == algo.digest_size()`.
#[derive(Clone, Eq, PartialEq)]
pub struct DigestBytes {
    algo: DigestAlgorithm,
    bytes: Box<[u8]>,
}

impl DigestBytes {
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algo
    }
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for DigestBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DigestBytes(algo={:?}, len={})",
            self.algo,
            self.bytes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        let d = DigestAlgorithm::Sha256.digest(b"abc");
        assert_eq!(d.as_slice().len(), 32);
        assert_eq!(
            &d.as_slice()[..4],
            &[0xba, 0x78, 0x16, 0xbf],
            "SHA-256(abc) prefix"
        );
    }

    #[test]
    fn parse_names() {
        assert_eq!("sha256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("SHA-256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        let err = "sha1".parse::<DigestAlgorithm>().unwrap_err();
        assert!(matches!(err, SigningError::DigestAlgorithmUnavailable(_)));
    }

    #[test]
    fn digest_length_matches_algorithm() {
        let algo = DigestAlgorithm::Sha256;
        let d = algo.digest(b"");
        assert_eq!(d.algorithm(), algo);
        assert_eq!(d.as_slice().len(), algo.digest_size());
    }
}
