//! CMS (RFC 5652) domain types for the CAdES-BES signer profile.

mod attributes;
mod ess;
mod time;

use std::fmt;

use base64::Engine as _;

pub use attributes::{SignedAttribute, SignedAttributeSet};
pub use ess::{signing_certificate_v2, EssCertIdV2};
pub use time::encode_signing_time;

/// DER-encoded `ContentInfo` wrapping a detached `SignedData`.
#[derive(Clone, PartialEq, Eq)]
pub struct CmsSignedData(Vec<u8>);

impl CmsSignedData {
    #[must_use]
    pub fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.0
    }

    /// Standard base64 with padding and no line breaks.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for CmsSignedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmsSignedData(len={})", self.0.len())
    }
}
