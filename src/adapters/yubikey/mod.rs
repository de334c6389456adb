//! `YubiKey` PIV hardware-token key provider.
//!
//! The device only performs raw RSA, so the provider hashes the message,
//! wraps the digest in a `DigestInfo` and applies PKCS#1 v1.5 padding
//! itself. Requires the `pcsc-backend` feature for device access.

mod key;
pub mod padding;
mod slot;

pub use key::PivRsaKey;
pub use slot::{PivPin, PivSlot};

#[cfg(feature = "pcsc-backend")]
pub use device::PivKeyProvider;

#[cfg(feature = "pcsc-backend")]
mod device {
    use std::sync::Mutex;

    use der::Encode;
    use yubikey::piv::{self, AlgorithmId};
    use yubikey::YubiKey;

    use super::padding;
    use super::{PivPin, PivRsaKey, PivSlot};
    use crate::adapters::key_provider::{KeyProvider, ProviderError};
    use crate::domain::crypto::SignatureAlgorithm;
    use crate::infra::error::{SigningError, SigningResult};

    /// Signs with the key in one PIV slot. Calls are serialised on the device lock.
    pub struct PivKeyProvider {
        device: Mutex<YubiKey>,
        slot: PivSlot,
        key: PivRsaKey,
        serial: u32,
        certificate_der: Vec<u8>,
    }

    impl PivKeyProvider {
        /// Open the first available token, verify `pin` and read the slot certificate.
        ///
        /// A slot whose certificate does not hold an RSA-1024 or RSA-2048 key
        /// is rejected here rather than on the first signature.
        pub fn open(pin: &PivPin, slot: PivSlot) -> SigningResult<Self> {
            let mut yubikey = YubiKey::open()
                .map_err(|e| SigningError::IdentityError(format!("Failed to open YubiKey: {e}")))?;
            yubikey
                .verify_pin(pin.as_bytes())
                .map_err(|e| SigningError::IdentityError(format!("PIN verification failed: {e}")))?;
            let certificate = yubikey::Certificate::read(&mut yubikey, slot.as_slot_id())
                .map_err(|e| {
                    SigningError::IdentityError(format!(
                        "Failed to read certificate from slot {slot}: {e}"
                    ))
                })?;
            let certificate_der = certificate.cert.to_der().map_err(|e| {
                SigningError::IdentityError(format!("Failed to encode certificate to DER: {e}"))
            })?;
            let key = PivRsaKey::from_certificate(&certificate_der)?;
            let serial: u32 = yubikey.serial().into();
            log::info!("Opened YubiKey {serial}, slot {slot} ({key})");
            Ok(Self {
                device: Mutex::new(yubikey),
                slot,
                key,
                serial,
                certificate_der,
            })
        }
    }

    impl KeyProvider for PivKeyProvider {
        fn certificate(&self) -> Result<Vec<u8>, ProviderError> {
            Ok(self.certificate_der.clone())
        }

        fn raw_sign(
            &self,
            data: &[u8],
            algorithm: SignatureAlgorithm,
        ) -> Result<Vec<u8>, ProviderError> {
            let digest = algorithm.digest_algorithm().digest(data);
            let info = padding::digest_info(&digest);
            let block = padding::pkcs1_v15_pad(&info, self.key.modulus_len()).ok_or_else(|| {
                ProviderError::KeyUnusable(format!("DigestInfo does not fit an {} block", self.key))
            })?;
            let mut device = self
                .device
                .lock()
                .map_err(|_| ProviderError::Device("device lock poisoned".into()))?;
            let algorithm_id = match self.key {
                PivRsaKey::Rsa1024 => AlgorithmId::Rsa1024,
                PivRsaKey::Rsa2048 => AlgorithmId::Rsa2048,
            };
            let signature =
                piv::sign_data(&mut device, &block, algorithm_id, self.slot.as_slot_id())
                    .map_err(|e| ProviderError::Device(e.to_string()))?;
            Ok(signature.to_vec())
        }

        fn describe(&self) -> String {
            format!("yubikey:{}:{}", self.serial, self.slot)
        }
    }
}
