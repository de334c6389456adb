//! CMS `SignedData` assembly for detached CAdES-BES signatures.
//!
//! ```text
//! ContentInfo {
//!   contentType  id-signedData,
//!   content [0] EXPLICIT SignedData {
//!     version          3,
//!     digestAlgorithms SET { sha256 },
//!     encapContentInfo { eContentType id-digestedData },   -- no eContent
//!     certificates [0] IMPLICIT { signer certificate },
//!     signerInfos      SET { SignerInfo } } }
//! ```

use crate::adapters::key_provider::SigningIdentity;
use crate::domain::cms::{CmsSignedData, SignedAttributeSet};
use crate::domain::constants;
use crate::domain::crypto::{CmsSignature, DigestAlgorithm, SignatureAlgorithm, SignerCertificate};
use crate::domain::der_writer;
use crate::infra::error::{SigningError, SigningResult};

/// Everything needed to encode one `SignedData`.
pub struct SignedDataFields<'a> {
    pub certificate: &'a SignerCertificate,
    pub digest_algorithm: DigestAlgorithm,
    pub attributes: &'a SignedAttributeSet,
    pub signature: &'a CmsSignature,
}

/// Encode `fields` as a DER `ContentInfo`.
#[must_use]
pub fn encode_signed_data(fields: &SignedDataFields<'_>) -> CmsSignedData {
    let digest_algorithm = der_writer::algorithm_identifier(&fields.digest_algorithm.oid());

    let sid = der_writer::sequence(&[
        fields.certificate.issuer_der(),
        fields.certificate.serial_der(),
    ]);
    // unsignedAttrs absent
    let signer_info = der_writer::sequence(&[
        &der_writer::small_integer(constants::SIGNER_INFO_VERSION),
        &sid,
        &digest_algorithm,
        &fields.attributes.to_embedded_der(),
        &der_writer::algorithm_identifier_null_params(&fields.signature.algorithm().oid()),
        &der_writer::octet_string(fields.signature.as_slice()),
    ]);

    let encap_content_info = der_writer::sequence(&[&der_writer::oid(&constants::OID_DIGESTED_DATA)]);
    let certificates = der_writer::tlv(constants::ASN1_CONTEXT_0_TAG, fields.certificate.as_der());
    let signed_data = der_writer::sequence(&[
        &der_writer::small_integer(constants::SIGNED_DATA_VERSION),
        &der_writer::set(&[&digest_algorithm]),
        &encap_content_info,
        &certificates,
        &der_writer::set(&[&signer_info]),
    ]);

    CmsSignedData::from_der(der_writer::sequence(&[
        &der_writer::oid(&constants::OID_SIGNED_DATA),
        &der_writer::tlv(constants::ASN1_CONTEXT_0_TAG, &signed_data),
    ]))
}

/// Signs an attribute set through the identity's key provider and wraps the
/// result in CMS.
#[derive(Debug, Clone, Copy)]
pub struct SignatureAssembler {
    signature_algorithm: SignatureAlgorithm,
}

impl Default for SignatureAssembler {
    fn default() -> Self {
        Self::new(SignatureAlgorithm::Sha256WithRsa)
    }
}

impl SignatureAssembler {
    #[must_use]
    pub fn new(signature_algorithm: SignatureAlgorithm) -> Self {
        Self {
            signature_algorithm,
        }
    }

    /// Produce the DER `ContentInfo` for `canonical` signed with `identity`.
    ///
    /// Every failure is a `SigningFailure`; the provider's own error stays
    /// reachable through `source()`.
    pub fn assemble_der(
        &self,
        canonical: &[u8],
        attrs: &SignedAttributeSet,
        identity: &SigningIdentity,
    ) -> SigningResult<CmsSignedData> {
        let digest_algorithm = self.signature_algorithm.digest_algorithm();
        check_message_digest(canonical, attrs, digest_algorithm)?;

        let signature = identity.sign(&attrs.to_signing_der(), self.signature_algorithm)?;
        let cms = encode_signed_data(&SignedDataFields {
            certificate: identity.certificate(),
            digest_algorithm,
            attributes: attrs,
            signature: &signature,
        });
        log::debug!(
            "Assembled CMS SignedData: {} bytes, signature {} bytes",
            cms.len(),
            signature.as_slice().len()
        );
        Ok(cms)
    }

    /// Same as [`assemble_der`](Self::assemble_der), base64-encoded.
    pub fn assemble(
        &self,
        canonical: &[u8],
        attrs: &SignedAttributeSet,
        identity: &SigningIdentity,
    ) -> SigningResult<String> {
        Ok(self.assemble_der(canonical, attrs, identity)?.to_base64())
    }
}

/// The attribute set must have been built over exactly these canonical bytes.
fn check_message_digest(
    canonical: &[u8],
    attrs: &SignedAttributeSet,
    digest_algorithm: DigestAlgorithm,
) -> SigningResult<()> {
    let attr = attrs.get(&constants::OID_MESSAGE_DIGEST).ok_or_else(|| {
        SigningError::signing_failure_msg("signed attributes lack messageDigest")
    })?;
    let expected = der_writer::octet_string(digest_algorithm.digest(canonical).as_slice());
    if attr.value_der() != expected.as_slice() {
        return Err(SigningError::signing_failure_msg(
            "messageDigest does not match the canonical document",
        ));
    }
    Ok(())
}
