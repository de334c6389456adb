//! Key-provider collaborator interface.
//!
//! The signing core never touches key material. It asks a [`KeyProvider`]
//! for the signer certificate once and for a raw signature per document.
//! Implementations:
//! - [`SoftwareKeyProvider`](super::keystore::SoftwareKeyProvider): OpenSSL PKCS#12 or PEM keystore
//! - `PivKeyProvider` in [`yubikey`](super::yubikey): hardware token, feature `pcsc-backend`
//! - [`SelfSignedIdentity`](super::trust_anchor::SelfSignedIdentity): throw-away self-signed identity

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::crypto::{CmsSignature, SignatureAlgorithm, SignerCertificate};
use crate::infra::error::{SigningError, SigningResult};

/// Provider-specific fault. The signing core maps it to `SigningFailure` and
/// keeps it as the error source.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("certificate unavailable: {0}")]
    CertificateUnavailable(String),

    #[error("key unusable: {0}")]
    KeyUnusable(String),

    #[error("device error: {0}")]
    Device(String),

    #[error(transparent)]
    OpenSsl(#[from] openssl::error::ErrorStack),
}

/// Source of the signer certificate and of raw signatures.
///
/// Both calls may block (token round trip). The core holds no lock while
/// calling them and does not assume they are reentrant; implementations
/// serialise internally when the underlying session requires it.
pub trait KeyProvider: Send + Sync {
    /// DER-encoded X.509 signer certificate.
    fn certificate(&self) -> Result<Vec<u8>, ProviderError>;

    /// Sign `data` (the full message, not a digest) with `algorithm`.
    fn raw_sign(&self, data: &[u8], algorithm: SignatureAlgorithm)
        -> Result<Vec<u8>, ProviderError>;

    /// Short label for logs.
    fn describe(&self) -> String {
        "key provider".to_string()
    }
}

/// Signer certificate plus the provider holding the matching private key.
///
/// Acquired once at startup and shared read-only across concurrent signs.
#[derive(Clone)]
pub struct SigningIdentity {
    certificate: SignerCertificate,
    provider: Arc<dyn KeyProvider>,
}

impl SigningIdentity {
    /// Fetch and parse the certificate from `provider`.
    ///
    /// Failures are `IdentityError`: the process cannot sign anything.
    pub fn acquire(provider: Arc<dyn KeyProvider>) -> SigningResult<Self> {
        let der = provider.certificate().map_err(|e| {
            SigningError::IdentityError(format!(
                "{} did not return a certificate: {e}",
                provider.describe()
            ))
        })?;
        let certificate = SignerCertificate::from_der(der)?;
        if !certificate.has_rsa_key() {
            return Err(SigningError::IdentityError(format!(
                "signer certificate {} does not carry an RSA key",
                certificate.subject()
            )));
        }
        log::info!(
            "Signing identity acquired from {}: subject={}, issuer={}",
            provider.describe(),
            certificate.subject(),
            certificate.issuer()
        );
        Ok(Self {
            certificate,
            provider,
        })
    }

    #[must_use]
    pub fn certificate(&self) -> &SignerCertificate {
        &self.certificate
    }

    /// Delegate to the provider, mapping its fault to `SigningFailure`.
    pub fn sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> SigningResult<CmsSignature> {
        let bytes = self
            .provider
            .raw_sign(data, algorithm)
            .map_err(|e| SigningError::signing_failure(format!("{algorithm} raw sign failed"), e))?;
        if bytes.is_empty() {
            return Err(SigningError::signing_failure_msg(
                "key provider returned an empty signature",
            ));
        }
        Ok(CmsSignature::new(algorithm, bytes))
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SigningIdentity(provider={}, certificate={:?})",
            self.provider.describe(),
            self.certificate
        )
    }
}
