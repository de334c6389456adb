//! Throw-away signing identities.

use std::sync::Arc;

use eta_signer::adapters::keystore::SoftwareKeyProvider;
use eta_signer::adapters::trust_anchor::{MonotonicSerialNumbers, TrustAnchorBuilder};
use eta_signer::{DigestAlgorithm, DocumentSigner, SigningIdentity};
use openssl::pkey::{PKey, Public};
use openssl::x509::X509;

pub const TEST_ISSUER: &str = "Egypt Trust Sealing CA";

/// Signer plus the certificate material tests verify against.
pub struct TestSigner {
    pub signer: DocumentSigner,
    pub certificate: X509,
    pub certificate_der: Vec<u8>,
}

impl TestSigner {
    pub fn public_key(&self) -> PKey<Public> {
        self.certificate.public_key().unwrap()
    }
}

/// Self-signed RSA-2048 identity issued by [`TEST_ISSUER`].
pub fn test_provider() -> (SoftwareKeyProvider, X509) {
    let identity = TrustAnchorBuilder::new()
        .organization("Egypt Trust")
        .common_name(TEST_ISSUER)
        .build(MonotonicSerialNumbers::global())
        .unwrap();
    let certificate = identity.certificate().clone();
    (identity.into_provider().unwrap(), certificate)
}

pub fn test_signer() -> TestSigner {
    let (provider, certificate) = test_provider();
    let identity = SigningIdentity::acquire(Arc::new(provider)).unwrap();
    TestSigner {
        signer: DocumentSigner::new(identity, DigestAlgorithm::Sha256),
        certificate_der: certificate.to_der().unwrap(),
        certificate,
    }
}
