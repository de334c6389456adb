//! Adapter layer modules for external system integration.
//!
//! Provides adapters for:
//! - Key providers (OpenSSL keystores, `YubiKey` PIV tokens, ephemeral identities)
//! - The REST transport serving batch signing requests

pub mod http;
pub mod key_provider;
pub mod keystore;
pub mod trust_anchor;
pub mod yubikey;

use std::sync::Arc;

use crate::infra::config::{KeystoreBackend, SignerConfiguration};
use crate::infra::error::{SigningError, SigningResult};
use key_provider::KeyProvider;
use keystore::SoftwareKeyProvider;
use trust_anchor::{MonotonicSerialNumbers, TrustAnchorBuilder};

/// Open the key provider selected by `[keystore]`.
pub fn open_key_provider(config: &SignerConfiguration) -> SigningResult<Arc<dyn KeyProvider>> {
    let keystore = &config.keystore;
    let digest_algorithm = config.signing.digest_algorithm()?;
    log::debug!("Opening {} keystore", keystore.backend);

    match keystore.backend {
        KeystoreBackend::Pkcs12 => {
            let password = keystore.resolved_password().unwrap_or_default();
            let provider = SoftwareKeyProvider::from_pkcs12(
                keystore.require_path()?,
                &password,
                &keystore.certificate_issuer_name,
                digest_algorithm,
            )?;
            Ok(Arc::new(provider))
        }
        KeystoreBackend::Pem => {
            let key_path = keystore.key_path.as_deref().ok_or_else(|| {
                SigningError::ConfigurationError(
                    "keystore.key_path is required for the pem backend".to_string(),
                )
            })?;
            let password = keystore.resolved_password();
            let provider = SoftwareKeyProvider::from_pem(
                keystore.require_path()?,
                key_path,
                password.as_deref(),
                &keystore.certificate_issuer_name,
                digest_algorithm,
            )?;
            Ok(Arc::new(provider))
        }
        KeystoreBackend::Piv => open_piv(config),
        KeystoreBackend::Ephemeral => {
            log::warn!("Using an ephemeral self-signed identity; signatures will not validate");
            let mut builder = TrustAnchorBuilder::new();
            if !keystore.certificate_issuer_name.is_empty() {
                builder = builder.common_name(&keystore.certificate_issuer_name);
            }
            let identity = builder.build(MonotonicSerialNumbers::global())?;
            Ok(Arc::new(identity.into_provider()?))
        }
    }
}

#[cfg(feature = "pcsc-backend")]
fn open_piv(config: &SignerConfiguration) -> SigningResult<Arc<dyn KeyProvider>> {
    let keystore = &config.keystore;
    let pin = keystore.resolved_password().ok_or_else(|| {
        SigningError::ConfigurationError(
            "keystore.password (the PIV PIN) is required for the piv backend".to_string(),
        )
    })?;
    let pin = yubikey::PivPin::new(pin)?;
    let provider = yubikey::PivKeyProvider::open(&pin, keystore.slot()?)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "pcsc-backend"))]
fn open_piv(_config: &SignerConfiguration) -> SigningResult<Arc<dyn KeyProvider>> {
    Err(SigningError::ConfigurationError(
        "The piv backend requires building with the 'pcsc-backend' feature".to_string(),
    ))
}
