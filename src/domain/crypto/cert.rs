use std::fmt;

use der::{Decode, Encode};
use x509_cert::Certificate;

use super::{DigestAlgorithm, DigestBytes};
use crate::domain::constants;
use crate::infra::error::{SigningError, SigningResult};

/// Signer certificate: the DER bytes as delivered by the key provider plus
/// the pieces of it the CMS structure needs.
///
/// `issuer_der` and `serial_der` are extracted once at construction so that
/// signing calls never re-parse the certificate.
#[derive(Clone)]
pub struct SignerCertificate {
    der: Box<[u8]>,
    issuer_der: Box<[u8]>,
    serial_der: Box<[u8]>,
    issuer: String,
    subject: String,
    rsa_key: bool,
}

impl SignerCertificate {
    /// Parse a DER certificate.
    pub fn from_der(der: Vec<u8>) -> SigningResult<Self> {
        let parsed = Certificate::from_der(&der).map_err(|e| {
            SigningError::IdentityError(format!("Failed to parse signer certificate: {e}"))
        })?;
        let tbs = &parsed.tbs_certificate;
        let issuer_der = tbs.issuer.to_der().map_err(|e| {
            SigningError::IdentityError(format!("Failed to encode certificate issuer: {e}"))
        })?;
        let serial_der = tbs.serial_number.to_der().map_err(|e| {
            SigningError::IdentityError(format!("Failed to encode certificate serial: {e}"))
        })?;
        let rsa_key = tbs.subject_public_key_info.algorithm.oid == constants::OID_RSA_ENCRYPTION;

        Ok(Self {
            der: der.into_boxed_slice(),
            issuer_der: issuer_der.into_boxed_slice(),
            serial_der: serial_der.into_boxed_slice(),
            issuer: tbs.issuer.to_string(),
            subject: tbs.subject.to_string(),
            rsa_key,
        })
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// DER `Name` of the issuer, exactly as it goes into `IssuerAndSerialNumber`.
    #[must_use]
    pub fn issuer_der(&self) -> &[u8] {
        &self.issuer_der
    }

    /// DER `INTEGER` of the serial number.
    #[must_use]
    pub fn serial_der(&self) -> &[u8] {
        &self.serial_der
    }

    /// RFC 4514 rendering of the issuer name.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// RFC 4514 rendering of the subject name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Whether the subject public key is an RSA key.
    #[must_use]
    pub fn has_rsa_key(&self) -> bool {
        self.rsa_key
    }

    /// Digest of the full DER certificate (ESS certHash).
    #[must_use]
    pub fn fingerprint(&self, algo: DigestAlgorithm) -> DigestBytes {
        algo.digest(&self.der)
    }
}

impl fmt::Debug for SignerCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SignerCertificate(subject={}, issuer={}, len={})",
            self.subject,
            self.issuer,
            self.der.len()
        )
    }
}
