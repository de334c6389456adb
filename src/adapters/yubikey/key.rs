//! RSA key sizes a PIV slot can sign with.

use std::fmt;

use openssl::x509::X509;

use crate::infra::error::{SigningError, SigningResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivRsaKey {
    Rsa1024,
    Rsa2048,
}

impl PivRsaKey {
    /// Size of the RSA key certified by `certificate_der`.
    ///
    /// The padded block handed to the token must be exactly one modulus long,
    /// so anything but RSA-1024 or RSA-2048 is an `IdentityError`.
    pub fn from_certificate(certificate_der: &[u8]) -> SigningResult<Self> {
        let rsa = X509::from_der(certificate_der)
            .and_then(|certificate| certificate.public_key())
            .and_then(|key| key.rsa())
            .map_err(|e| {
                SigningError::IdentityError(format!(
                    "Slot certificate does not carry an RSA public key: {e}"
                ))
            })?;
        match rsa.size() {
            128 => Ok(Self::Rsa1024),
            256 => Ok(Self::Rsa2048),
            bytes => Err(SigningError::IdentityError(format!(
                "Unsupported PIV key size: RSA-{} (expected RSA-1024 or RSA-2048)",
                bytes * 8
            ))),
        }
    }

    /// Modulus length in bytes.
    #[must_use]
    pub fn modulus_len(self) -> usize {
        match self {
            Self::Rsa1024 => 128,
            Self::Rsa2048 => 256,
        }
    }
}

impl fmt::Display for PivRsaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RSA-{}", self.modulus_len() * 8)
    }
}
