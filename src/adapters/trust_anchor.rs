//! Self-signed signer identities and certificate serial numbers.
//!
//! Used by the `ephemeral` keystore backend and by tests. Serial numbers
//! come from an injectable [`SerialNumberSource`] so that tests can pin them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder, X509};

use super::keystore::SoftwareKeyProvider;
use crate::domain::crypto::DigestAlgorithm;
use crate::infra::error::{SigningError, SigningResult};

/// Hands out certificate serial numbers.
pub trait SerialNumberSource: Send + Sync {
    fn next_serial(&self) -> u64;
}

/// Strictly increasing serials, seeded with wall-clock milliseconds.
#[derive(Debug)]
pub struct MonotonicSerialNumbers {
    next: AtomicU64,
}

impl MonotonicSerialNumbers {
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Seed with the current Unix time in milliseconds.
    #[must_use]
    pub fn seeded_now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(1);
        Self::starting_at(millis)
    }

    /// Process-wide instance, seeded on first use.
    pub fn global() -> &'static MonotonicSerialNumbers {
        static GLOBAL: OnceLock<MonotonicSerialNumbers> = OnceLock::new();
        GLOBAL.get_or_init(Self::seeded_now)
    }
}

impl SerialNumberSource for MonotonicSerialNumbers {
    fn next_serial(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Always returns the same serial.
#[derive(Debug, Clone, Copy)]
pub struct FixedSerialNumbers(u64);

impl FixedSerialNumbers {
    #[must_use]
    pub fn new(serial: u64) -> Self {
        Self(serial)
    }
}

impl SerialNumberSource for FixedSerialNumbers {
    fn next_serial(&self) -> u64 {
        self.0
    }
}

/// Builder for a self-signed RSA certificate acting as its own trust anchor.
#[derive(Debug, Clone)]
pub struct TrustAnchorBuilder {
    country: String,
    organization: String,
    common_name: String,
    key_bits: u32,
    validity_days: u32,
}

impl Default for TrustAnchorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustAnchorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            country: "EG".to_string(),
            organization: "eta-signer".to_string(),
            common_name: "Demo Root Certificate".to_string(),
            key_bits: 2048,
            validity_days: 31,
        }
    }

    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    #[must_use]
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    #[must_use]
    pub fn common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    #[must_use]
    pub fn key_bits(mut self, bits: u32) -> Self {
        self.key_bits = bits;
        self
    }

    #[must_use]
    pub fn validity_days(mut self, days: u32) -> Self {
        self.validity_days = days;
        self
    }

    /// Generate a key pair and a v3 certificate signed by it.
    pub fn build(&self, serials: &dyn SerialNumberSource) -> SigningResult<SelfSignedIdentity> {
        let rsa = Rsa::generate(self.key_bits)
            .map_err(|e| SigningError::IdentityError(format!("RSA gen failed: {e}")))?;
        let key = PKey::from_rsa(rsa)
            .map_err(|e| SigningError::IdentityError(format!("PKey failed: {e}")))?;

        let mut name = X509NameBuilder::new()
            .map_err(|e| SigningError::IdentityError(format!("Name builder: {e}")))?;
        for (field, value) in [
            ("C", &self.country),
            ("O", &self.organization),
            ("CN", &self.common_name),
        ] {
            name.append_entry_by_text(field, value)
                .map_err(|e| SigningError::IdentityError(format!("Name entry {field}: {e}")))?;
        }
        let name = name.build();

        let serial = BigNum::from_dec_str(&serials.next_serial().to_string())
            .and_then(|bn| bn.to_asn1_integer())
            .map_err(|e| SigningError::IdentityError(format!("Serial number: {e}")))?;
        let not_before = Asn1Time::days_from_now(0)
            .map_err(|e| SigningError::IdentityError(format!("not_before: {e}")))?;
        let not_after = Asn1Time::days_from_now(self.validity_days)
            .map_err(|e| SigningError::IdentityError(format!("not_after: {e}")))?;

        let mut builder = X509Builder::new()
            .map_err(|e| SigningError::IdentityError(format!("X509 builder: {e}")))?;
        let fill = |builder: &mut X509Builder| -> Result<(), ErrorStack> {
            builder.set_version(2)?;
            builder.set_serial_number(&serial)?;
            builder.set_subject_name(&name)?;
            builder.set_issuer_name(&name)?;
            builder.set_not_before(&not_before)?;
            builder.set_not_after(&not_after)?;
            builder.set_pubkey(&key)?;
            builder.sign(&key, MessageDigest::sha256())
        };
        fill(&mut builder)
            .map_err(|e| SigningError::IdentityError(format!("Certificate build: {e}")))?;

        Ok(SelfSignedIdentity {
            certificate: builder.build(),
            key,
        })
    }
}

/// Key pair plus self-signed certificate.
pub struct SelfSignedIdentity {
    certificate: X509,
    key: PKey<Private>,
}

impl SelfSignedIdentity {
    #[must_use]
    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    #[must_use]
    pub fn private_key(&self) -> &PKey<Private> {
        &self.key
    }

    pub fn certificate_der(&self) -> SigningResult<Vec<u8>> {
        self.certificate
            .to_der()
            .map_err(|e| SigningError::IdentityError(format!("Certificate encode: {e}")))
    }

    /// Hand the key pair to an in-memory provider.
    pub fn into_provider(self) -> SigningResult<SoftwareKeyProvider> {
        let label = format!("ephemeral:{}", self.serial_hex());
        Ok(SoftwareKeyProvider::from_parts(self.certificate, self.key, DigestAlgorithm::Sha256)?
            .with_label(label))
    }

    fn serial_hex(&self) -> String {
        self.certificate
            .serial_number()
            .to_bn()
            .and_then(|bn| bn.to_hex_str().map(|s| s.to_string()))
            .unwrap_or_default()
    }
}
