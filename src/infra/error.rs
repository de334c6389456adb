//! Error types for document signing operations.

use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Boxed underlying cause carried by [`SigningError::SigningFailure`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error taxonomy for the signing pipeline.
///
/// `InvalidDocumentFormat`, `SigningFailure` and `Cancelled` are reported per
/// document. `DigestAlgorithmUnavailable`, `ConfigurationError` and
/// `IdentityError` mean the deployment itself is broken.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum SigningError {
    #[error("Invalid document format: {0}")]
    #[diagnostic(code(eta_signer::invalid_document_format))]
    InvalidDocumentFormat(String),

    #[error("Digest algorithm unavailable: {0}")]
    #[diagnostic(
        code(eta_signer::digest_algorithm_unavailable),
        help("the runtime cryptographic provider must offer SHA-256")
    )]
    DigestAlgorithmUnavailable(String),

    #[error("Signing failure: {message}")]
    #[diagnostic(code(eta_signer::signing_failure))]
    SigningFailure {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(eta_signer::configuration))]
    ConfigurationError(String),

    #[error("Signing identity error: {0}")]
    #[diagnostic(code(eta_signer::identity))]
    IdentityError(String),

    #[error("Cancelled: {0}")]
    #[diagnostic(code(eta_signer::cancelled))]
    Cancelled(String),

    #[error("IO error: {0}")]
    #[diagnostic(code(eta_signer::io))]
    IoError(String),
}

impl SigningError {
    /// Build a `SigningFailure` that keeps `source` as the underlying cause.
    pub fn signing_failure(
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        SigningError::SigningFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Build a `SigningFailure` without an underlying cause.
    pub fn signing_failure_msg(message: impl Into<String>) -> Self {
        SigningError::SigningFailure {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the error means the process cannot sign anything at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SigningError::DigestAlgorithmUnavailable(_)
                | SigningError::ConfigurationError(_)
                | SigningError::IdentityError(_)
        )
    }

    /// Stable machine-readable code, used on the wire.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            SigningError::InvalidDocumentFormat(_) => "INVALID_DOCUMENT_FORMAT",
            SigningError::DigestAlgorithmUnavailable(_) => "DIGEST_ALGORITHM_UNAVAILABLE",
            SigningError::SigningFailure { .. } => "SIGNING_FAILURE",
            SigningError::ConfigurationError(_) => "CONFIGURATION_ERROR",
            SigningError::IdentityError(_) => "IDENTITY_ERROR",
            SigningError::Cancelled(_) => "CANCELLED",
            SigningError::IoError(_) => "IO_ERROR",
        }
    }

    /// Render the error followed by its `source()` chain, for log lines.
    #[must_use]
    pub fn chain_to_string(&self) -> String {
        use std::error::Error as _;
        let mut rendered = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            rendered.push_str(": ");
            rendered.push_str(&err.to_string());
            cause = err.source();
        }
        rendered
    }
}

impl From<serde_json::Error> for SigningError {
    fn from(error: serde_json::Error) -> Self {
        SigningError::InvalidDocumentFormat(error.to_string())
    }
}

impl From<der::Error> for SigningError {
    fn from(error: der::Error) -> Self {
        SigningError::signing_failure("ASN.1 encoding failed", error)
    }
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let error = SigningError::InvalidDocumentFormat("expected value".to_string());
        assert_eq!(error.to_string(), "Invalid document format: expected value");

        let error = SigningError::DigestAlgorithmUnavailable("sha1".to_string());
        assert_eq!(error.to_string(), "Digest algorithm unavailable: sha1");
    }

    #[test]
    fn signing_failure_keeps_source() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "token removed");
        let error = SigningError::signing_failure("raw sign failed", cause);
        let source = error.source().expect("source preserved");
        assert_eq!(source.to_string(), "token removed");
        assert_eq!(
            error.chain_to_string(),
            "Signing failure: raw sign failed: token removed"
        );
    }

    #[test]
    fn fatal_classification() {
        assert!(SigningError::ConfigurationError("x".into()).is_fatal());
        assert!(SigningError::IdentityError("x".into()).is_fatal());
        assert!(SigningError::DigestAlgorithmUnavailable("x".into()).is_fatal());
        assert!(!SigningError::InvalidDocumentFormat("x".into()).is_fatal());
        assert!(!SigningError::signing_failure_msg("x").is_fatal());
        assert!(!SigningError::Cancelled("x".into()).is_fatal());
    }

    #[test]
    fn serde_json_errors_are_document_format_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let converted: SigningError = err.into();
        assert!(matches!(converted, SigningError::InvalidDocumentFormat(_)));
        assert_eq!(converted.code(), "INVALID_DOCUMENT_FORMAT");
    }
}
