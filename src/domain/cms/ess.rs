//! ESS `SigningCertificateV2` (RFC 5035) encoding.
//!
//! ```text
//! SigningCertificateV2 ::= SEQUENCE {
//!     certs    SEQUENCE OF ESSCertIDv2,
//!     policies SEQUENCE OF PolicyInformation OPTIONAL }
//!
//! ESSCertIDv2 ::= SEQUENCE {
//!     hashAlgorithm AlgorithmIdentifier DEFAULT {algorithm id-sha256},
//!     certHash      Hash,
//!     issuerSerial  IssuerSerial OPTIONAL }
//! ```

use crate::domain::crypto::{DigestAlgorithm, DigestBytes, SignerCertificate};
use crate::domain::der_writer;

/// Certificate reference binding a signature to one signer certificate.
#[derive(Debug, Clone)]
pub struct EssCertIdV2 {
    cert_hash: DigestBytes,
}

impl EssCertIdV2 {
    /// Reference `certificate` by its digest under `algo`.
    #[must_use]
    pub fn for_certificate(certificate: &SignerCertificate, algo: DigestAlgorithm) -> Self {
        Self {
            cert_hash: certificate.fingerprint(algo),
        }
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> DigestAlgorithm {
        self.cert_hash.algorithm()
    }

    #[must_use]
    pub fn cert_hash(&self) -> &[u8] {
        self.cert_hash.as_slice()
    }

    /// DER of the `ESSCertIDv2` SEQUENCE.
    ///
    /// The hash algorithm names the digest algorithm (never the attribute
    /// type). SHA-256 equals the DEFAULT and is therefore omitted under DER.
    #[must_use]
    pub fn to_der(&self) -> Vec<u8> {
        let cert_hash = der_writer::octet_string(self.cert_hash.as_slice());
        let algo = self.hash_algorithm();
        if algo == DigestAlgorithm::Sha256 {
            der_writer::sequence(&[&cert_hash])
        } else {
            der_writer::sequence(&[&der_writer::algorithm_identifier(&algo.oid()), &cert_hash])
        }
    }
}

/// `SigningCertificateV2` value with exactly one certificate reference and no policies.
#[must_use]
pub fn signing_certificate_v2(cert_id: &EssCertIdV2) -> Vec<u8> {
    let certs = der_writer::sequence(&[&cert_id.to_der()]);
    der_writer::sequence(&[&certs])
}
