//! PIV slot and PIN value types.

use std::fmt;
use std::str::FromStr;

use crate::infra::error::{SigningError, SigningResult};

/// PIV PIN, validated on construction. Never printed.
#[derive(Clone)]
pub struct PivPin(String);

impl PivPin {
    pub fn new(pin: impl AsRef<str>) -> SigningResult<Self> {
        let pin = pin.as_ref();
        if !(6..=8).contains(&pin.len()) {
            return Err(SigningError::ConfigurationError(format!(
                "PIV PIN must be 6 to 8 characters, got {}",
                pin.len()
            )));
        }
        if !pin.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SigningError::ConfigurationError(
                "PIV PIN must contain only alphanumeric characters".to_string(),
            ));
        }
        Ok(PivPin(pin.to_string()))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for PivPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PivPin([REDACTED])")
    }
}

/// One of the four standard PIV key slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivSlot(u8);

impl PivSlot {
    pub fn new(slot: u8) -> SigningResult<Self> {
        match slot {
            0x9a | 0x9c | 0x9d | 0x9e => Ok(PivSlot(slot)),
            _ => Err(SigningError::ConfigurationError(format!(
                "Invalid PIV slot 0x{slot:02x}. Valid slots: 9a, 9c, 9d, 9e"
            ))),
        }
    }

    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }

    #[cfg(feature = "pcsc-backend")]
    #[must_use]
    pub fn as_slot_id(&self) -> yubikey::piv::SlotId {
        match self.0 {
            0x9a => yubikey::piv::SlotId::Authentication,
            0x9d => yubikey::piv::SlotId::KeyManagement,
            0x9e => yubikey::piv::SlotId::CardAuthentication,
            _ => yubikey::piv::SlotId::Signature,
        }
    }
}

impl Default for PivSlot {
    fn default() -> Self {
        PivSlot(0x9c)
    }
}

impl FromStr for PivSlot {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("0x");
        let slot = u8::from_str_radix(trimmed, 16).map_err(|_| {
            SigningError::ConfigurationError(format!(
                "Invalid slot format '{s}'. Expected hex value (9a, 9c, 9d, or 9e)"
            ))
        })?;
        Self::new(slot)
    }
}

impl fmt::Display for PivSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}
