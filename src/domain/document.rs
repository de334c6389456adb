//! Shape of the signature entries merged into a signed document, and of
//! batch responses.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::domain::constants;

/// One element of a document's `signatures` array.
///
/// Serializes with `signatureType` before `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEntry {
    #[serde(rename = "signatureType")]
    pub signature_type: String,
    pub value: String,
}

impl SignatureEntry {
    /// Issuer signature (`signatureType = "I"`) carrying a base64 CMS blob.
    #[must_use]
    pub fn issuer(value: impl Into<String>) -> Self {
        Self {
            signature_type: constants::ISSUER_SIGNATURE_TYPE.to_string(),
            value: value.into(),
        }
    }
}

/// One element of the `errors` array of a partially failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrorEntry {
    /// Position of the failed document in the request envelope.
    pub index: usize,
    pub code: String,
    pub message: String,
}

/// Result envelope of a batch: signed documents in input order.
///
/// `errors` is present only when some documents failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignBatchResponse {
    pub documents: Vec<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchErrorEntry>,
}
