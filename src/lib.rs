//! ETA Document Signer Library
//!
//! Signs JSON e-invoice documents with detached CAdES-BES signatures.
//! A document is canonicalized into a flat string of quoted tokens, a CMS
//! `SignedData` is built over that string with SHA-256 and RSA, and the
//! base64 result is merged back into the document under `signatures`.
//!
//! Layers:
//! - `domain`: DER framing, OIDs, CMS and crypto value types
//! - `services`: canonicalizer, signed attributes, CMS assembly, merge
//! - `pipelines`: single-document signer and batch orchestration
//! - `adapters`: key providers and the REST transport
//! - `infra`: errors, configuration, logging

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use adapters::key_provider::{KeyProvider, ProviderError, SigningIdentity};
pub use domain::crypto::{DigestAlgorithm, SignatureAlgorithm};
pub use infra::config::{ConfigManager, SignerConfiguration};
pub use infra::error::{SigningError, SigningResult};
pub use pipelines::{BatchOrchestrator, BatchReport, DocumentSigner};
pub use services::{canonicalize, merge};

/// Open the configured key provider and build a signer over it.
///
/// Every error here is fatal for the process (`is_fatal()`).
pub fn signer_from_config(config: &SignerConfiguration) -> SigningResult<DocumentSigner> {
    let digest_algorithm = config.signing.digest_algorithm()?;
    let provider = adapters::open_key_provider(config)?;
    let identity = SigningIdentity::acquire(provider)?;
    Ok(DocumentSigner::new(identity, digest_algorithm))
}
