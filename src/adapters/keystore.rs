//! OpenSSL software keystore provider (PKCS#12 archive or PEM pair).

use std::fmt;
use std::path::Path;

use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{Id, PKey, Private};
use openssl::sign::Signer;
use openssl::x509::{X509NameRef, X509};

use super::key_provider::{KeyProvider, ProviderError};
use crate::domain::crypto::{DigestAlgorithm, SignatureAlgorithm};
use crate::infra::error::{SigningError, SigningResult};

/// Private key and certificate held in process memory.
pub struct SoftwareKeyProvider {
    certificate: X509,
    key: PKey<Private>,
    digest: MessageDigest,
    label: String,
}

impl SoftwareKeyProvider {
    /// Open a PKCS#12 archive. The certificate issuer must contain `issuer_match`.
    pub fn from_pkcs12(
        path: &Path,
        password: &str,
        issuer_match: &str,
        digest_algorithm: DigestAlgorithm,
    ) -> SigningResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            SigningError::IdentityError(format!("Failed to read keystore {}: {e}", path.display()))
        })?;
        let archive = Pkcs12::from_der(&bytes).map_err(|e| {
            SigningError::IdentityError(format!("Not a PKCS#12 archive {}: {e}", path.display()))
        })?;
        let parsed = archive.parse2(password).map_err(|e| {
            SigningError::IdentityError(format!("Failed to open keystore {}: {e}", path.display()))
        })?;
        let key = parsed.pkey.ok_or_else(|| {
            SigningError::IdentityError(format!("Keystore {} holds no private key", path.display()))
        })?;
        let certificate = parsed.cert.ok_or_else(|| {
            SigningError::IdentityError(format!("Keystore {} holds no certificate", path.display()))
        })?;
        let provider = Self::from_parts(certificate, key, digest_algorithm)?
            .with_label(format!("pkcs12:{}", path.display()));
        provider.require_issuer(issuer_match)?;
        Ok(provider)
    }

    /// Open a PEM certificate and PEM private key (optionally encrypted).
    pub fn from_pem(
        certificate_path: &Path,
        key_path: &Path,
        password: Option<&str>,
        issuer_match: &str,
        digest_algorithm: DigestAlgorithm,
    ) -> SigningResult<Self> {
        let cert_pem = std::fs::read(certificate_path).map_err(|e| {
            SigningError::IdentityError(format!(
                "Failed to read certificate {}: {e}",
                certificate_path.display()
            ))
        })?;
        let key_pem = std::fs::read(key_path).map_err(|e| {
            SigningError::IdentityError(format!("Failed to read key {}: {e}", key_path.display()))
        })?;
        let certificate = X509::from_pem(&cert_pem).map_err(|e| {
            SigningError::IdentityError(format!("Invalid PEM certificate: {e}"))
        })?;
        let key = match password {
            Some(pw) => PKey::private_key_from_pem_passphrase(&key_pem, pw.as_bytes()),
            None => PKey::private_key_from_pem(&key_pem),
        }
        .map_err(|e| SigningError::IdentityError(format!("Invalid PEM private key: {e}")))?;

        let provider = Self::from_parts(certificate, key, digest_algorithm)?
            .with_label(format!("pem:{}", certificate_path.display()));
        provider.require_issuer(issuer_match)?;
        Ok(provider)
    }

    /// Wrap an in-memory key pair. The key must be RSA and match the certificate.
    pub fn from_parts(
        certificate: X509,
        key: PKey<Private>,
        digest_algorithm: DigestAlgorithm,
    ) -> SigningResult<Self> {
        if key.id() != Id::RSA {
            return Err(SigningError::IdentityError(format!(
                "Unsupported key type {:?}; an RSA key is required",
                key.id()
            )));
        }
        let public = certificate
            .public_key()
            .map_err(|e| SigningError::IdentityError(format!("Certificate public key: {e}")))?;
        if !public.public_eq(&key) {
            return Err(SigningError::IdentityError(
                "Private key does not match the certificate".to_string(),
            ));
        }
        let digest = MessageDigest::from_name(digest_algorithm.as_str()).ok_or_else(|| {
            SigningError::DigestAlgorithmUnavailable(format!(
                "OpenSSL runtime does not provide {digest_algorithm}"
            ))
        })?;
        Ok(Self {
            certificate,
            key,
            digest,
            label: "software".to_string(),
        })
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Issuer rendered as `CN=..., O=..., C=..`.
    #[must_use]
    pub fn issuer(&self) -> String {
        render_name(self.certificate.issuer_name())
    }

    fn require_issuer(&self, issuer_match: &str) -> SigningResult<()> {
        let issuer = self.issuer();
        if issuer.contains(issuer_match) {
            Ok(())
        } else {
            Err(SigningError::IdentityError(format!(
                "Certificate issuer '{issuer}' does not contain '{issuer_match}'"
            )))
        }
    }
}

impl KeyProvider for SoftwareKeyProvider {
    fn certificate(&self) -> Result<Vec<u8>, ProviderError> {
        Ok(self.certificate.to_der()?)
    }

    fn raw_sign(
        &self,
        data: &[u8],
        algorithm: SignatureAlgorithm,
    ) -> Result<Vec<u8>, ProviderError> {
        match algorithm {
            SignatureAlgorithm::Sha256WithRsa => {
                let mut signer = Signer::new(self.digest, &self.key)?;
                signer.update(data)?;
                Ok(signer.sign_to_vec()?)
            }
        }
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

impl fmt::Debug for SoftwareKeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SoftwareKeyProvider({})", self.label)
    }
}

/// Render an X.509 name as comma separated `SN=value` pairs, most specific first.
pub(crate) fn render_name(name: &X509NameRef) -> String {
    let mut parts: Vec<String> = name
        .entries()
        .map(|entry| {
            let field = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|s| s.to_string())
                .unwrap_or_default();
            format!("{field}={value}")
        })
        .collect();
    parts.reverse();
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::trust_anchor::{FixedSerialNumbers, TrustAnchorBuilder};
    use openssl::rsa::Rsa;

    #[test]
    fn rejects_mismatched_key() {
        let identity = TrustAnchorBuilder::new()
            .build(&FixedSerialNumbers::new(7))
            .unwrap();
        let other = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
        let err = SoftwareKeyProvider::from_parts(
            identity.certificate().clone(),
            other,
            DigestAlgorithm::Sha256,
        )
        .unwrap_err();
        assert!(matches!(err, SigningError::IdentityError(_)));
    }

    #[test]
    fn issuer_match_is_a_substring_test() {
        let identity = TrustAnchorBuilder::new()
            .organization("Egypt Trust")
            .common_name("Egypt Trust Sealing CA")
            .build(&FixedSerialNumbers::new(7))
            .unwrap();
        let provider = identity.into_provider().unwrap();
        assert!(provider.issuer().contains("CN=Egypt Trust Sealing CA"));
        assert!(provider.require_issuer("Egypt Trust Sealing").is_ok());
        assert!(matches!(
            provider.require_issuer("Other CA"),
            Err(SigningError::IdentityError(_))
        ));
    }

    #[test]
    fn pkcs12_round_trip_through_disk() {
        let identity = TrustAnchorBuilder::new()
            .common_name("Keystore Test")
            .build(&FixedSerialNumbers::new(11))
            .unwrap();
        let mut builder = Pkcs12::builder();
        builder.name("signer");
        builder.pkey(identity.private_key());
        builder.cert(identity.certificate());
        let archive = builder.build2("secret").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signer.p12");
        std::fs::write(&path, archive.to_der().unwrap()).unwrap();

        let provider =
            SoftwareKeyProvider::from_pkcs12(&path, "secret", "Keystore Test", DigestAlgorithm::Sha256)
                .unwrap();
        let sig = provider
            .raw_sign(b"payload", SignatureAlgorithm::Sha256WithRsa)
            .unwrap();
        assert_eq!(sig.len(), 256);

        let wrong = SoftwareKeyProvider::from_pkcs12(&path, "nope", "", DigestAlgorithm::Sha256);
        assert!(matches!(wrong, Err(SigningError::IdentityError(_))));
    }
}
