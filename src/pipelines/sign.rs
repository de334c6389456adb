//! `DocumentSigner`: canonicalize, build attributes, sign and merge one document.

use std::sync::Arc;

use crate::adapters::key_provider::SigningIdentity;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::crypto::{DigestAlgorithm, SignatureAlgorithm};
use crate::domain::json::RawObject;
use crate::infra::error::SigningResult;
use crate::services::{
    canonicalize_object, merge_fields, SignatureAssembler, SignedAttributesBuilder,
};

/// Single-document signing pipeline. Cheap to share behind an `Arc`.
pub struct DocumentSigner {
    identity: SigningIdentity,
    attributes: SignedAttributesBuilder,
    assembler: SignatureAssembler,
    clock: Arc<dyn Clock>,
}

impl DocumentSigner {
    /// Pipeline over `identity` using the wall clock.
    ///
    /// `digest_algorithm` comes from configuration; anything but SHA-256 was
    /// already rejected with `DigestAlgorithmUnavailable` when it was parsed.
    #[must_use]
    pub fn new(identity: SigningIdentity, digest_algorithm: DigestAlgorithm) -> Self {
        Self {
            identity,
            attributes: SignedAttributesBuilder::new(digest_algorithm),
            assembler: SignatureAssembler::new(SignatureAlgorithm::Sha256WithRsa),
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Base64 CMS signature over a canonical string.
    pub fn signature_for(&self, canonical: &str) -> SigningResult<String> {
        let canonical = canonical.as_bytes();
        let signing_time = self.clock.now();
        let attrs = self
            .attributes
            .build(canonical, self.identity.certificate(), signing_time)?;
        self.assembler.assemble(canonical, &attrs, &self.identity)
    }

    /// Sign a document and return it with `signatures` merged in.
    ///
    /// The signature covers the canonical form of the source text; member
    /// values are carried into the result unchanged.
    pub fn sign_fields(&self, document: RawObject) -> SigningResult<RawObject> {
        let canonical = canonicalize_object(&document)?;
        log::debug!("Canonical form: {} bytes", canonical.len());
        let signature = self.signature_for(&canonical)?;
        merge_fields(document, &signature)
    }

    /// Text in, text out. Anything but a JSON object is `InvalidDocumentFormat`.
    pub fn sign_text(&self, document: &str) -> SigningResult<String> {
        self.sign_fields(RawObject::parse(document)?)?.to_json_string()
    }
}
