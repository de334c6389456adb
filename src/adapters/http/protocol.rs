//! Wire types of the signing REST API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/sign` responses with status 200 or 422.
pub use crate::domain::document::{BatchErrorEntry, SignBatchResponse};

/// API version reported by the status endpoint and in error bodies.
pub const API_VERSION: &str = "1.0";

/// Status response with server and signer information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub server_version: String,
    /// Whether a signing identity is loaded.
    pub ready: bool,
    pub signer_subject: String,
    pub signer_issuer: String,
    pub max_concurrency: usize,
    pub uptime_seconds: u64,
}

/// Error response from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub version: String,
    /// Error code for programmatic handling.
    pub error_code: String,
    pub message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            version: API_VERSION.to_string(),
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

/// Codes used by the transport itself. Signing errors carry
/// [`SigningError::code`](crate::infra::error::SigningError::code) instead.
pub mod error_codes {
    /// Missing or wrong basic-auth credentials.
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    /// Body is not UTF-8 text.
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_serializes_all_fields() {
        let error = ErrorResponse::new("INVALID_DOCUMENT_FORMAT", "bad");
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"version":"1.0","error_code":"INVALID_DOCUMENT_FORMAT","message":"bad"}"#
        );
    }

    #[test]
    fn error_response_carries_version() {
        let error = ErrorResponse::new(error_codes::AUTH_FAILED, "nope");
        assert_eq!(error.version, API_VERSION);
        assert_eq!(error.error_code, "AUTH_FAILED");
    }
}
