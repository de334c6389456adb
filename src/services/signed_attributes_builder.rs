//! Service for constructing the CAdES-BES signed attribute set.

use std::time::SystemTime;

use crate::domain::cms::{
    encode_signing_time, signing_certificate_v2, EssCertIdV2, SignedAttribute, SignedAttributeSet,
};
use crate::domain::constants;
use crate::domain::crypto::{DigestAlgorithm, SignerCertificate};
use crate::domain::der_writer;
use crate::infra::error::SigningResult;

/// Builds `contentType`, `messageDigest`, `signingTime` and
/// `signingCertificateV2` for one signature.
#[derive(Debug, Clone, Copy)]
pub struct SignedAttributesBuilder {
    digest_algorithm: DigestAlgorithm,
}

impl Default for SignedAttributesBuilder {
    fn default() -> Self {
        Self::new(DigestAlgorithm::Sha256)
    }
}

impl SignedAttributesBuilder {
    #[must_use]
    pub fn new(digest_algorithm: DigestAlgorithm) -> Self {
        Self { digest_algorithm }
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest_algorithm
    }

    /// Build a fresh attribute set over `canonical` for `certificate` at `signing_time`.
    pub fn build(
        &self,
        canonical: &[u8],
        certificate: &SignerCertificate,
        signing_time: SystemTime,
    ) -> SigningResult<SignedAttributeSet> {
        let content_type = SignedAttribute::new(
            constants::OID_CONTENT_TYPE,
            der_writer::oid(&constants::OID_DIGESTED_DATA),
        );

        let message_digest = self.digest_algorithm.digest(canonical);
        let message_digest = SignedAttribute::new(
            constants::OID_MESSAGE_DIGEST,
            der_writer::octet_string(message_digest.as_slice()),
        );

        let signing_time =
            SignedAttribute::new(constants::OID_SIGNING_TIME, encode_signing_time(signing_time)?);

        let cert_id = EssCertIdV2::for_certificate(certificate, self.digest_algorithm);
        let signing_certificate = SignedAttribute::new(
            constants::OID_SIGNING_CERTIFICATE_V2,
            signing_certificate_v2(&cert_id),
        );

        let attrs = SignedAttributeSet::new(vec![
            content_type,
            message_digest,
            signing_time,
            signing_certificate,
        ]);
        log::debug!(
            "Built {} signed attributes ({} bytes) over {} canonical bytes",
            attrs.len(),
            attrs.to_signing_der().len(),
            canonical.len()
        );
        Ok(attrs)
    }
}
