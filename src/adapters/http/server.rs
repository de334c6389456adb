//! Batch signing HTTP server.
//!
//! Credentials are checked against a SHA-256 of the password held in
//! configuration, compared in constant time. Batches are signed on the
//! shared [`BatchOrchestrator`]; a shutdown cancels dispatch of whatever
//! batches are still running.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine as _;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::Filter;

use super::protocol::{error_codes, ErrorResponse, StatusResponse, API_VERSION};
use crate::infra::config::ServerConfig;
use crate::infra::error::{SigningError, SigningResult};
use crate::pipelines::BatchOrchestrator;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

/// Shared state for the server handlers.
pub struct ServerState {
    orchestrator: BatchOrchestrator,
    username: String,
    /// Lowercase hex SHA-256 of the expected password.
    password_sha256: String,
    start_time: Instant,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState").finish_non_exhaustive()
    }
}

impl ServerState {
    /// Fails with `ConfigurationError` unless `server.username` and
    /// `server.password_sha256` are both set.
    pub fn new(orchestrator: BatchOrchestrator, config: &ServerConfig) -> SigningResult<Arc<Self>> {
        if !config.has_credentials() {
            return Err(SigningError::ConfigurationError(
                "server.username and server.password_sha256 must be set to serve requests"
                    .to_string(),
            ));
        }
        Ok(Arc::new(Self {
            orchestrator,
            username: config.username.clone(),
            password_sha256: config.password_sha256.to_ascii_lowercase(),
            start_time: Instant::now(),
            shutdown: CancellationToken::new(),
        }))
    }

    /// Cancelling this token stops dispatch in every running batch.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn validate_auth(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(self.username.as_bytes(), username.as_bytes());
        let password_ok = constant_time_eq(
            self.password_sha256.as_bytes(),
            sha256_hex(password.as_bytes()).as_bytes(),
        );
        user_ok & password_ok
    }
}

/// Lowercase hex SHA-256.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    let mut result = 0u8;
    for (a, b) in expected.iter().zip(provided) {
        result |= a ^ b;
    }
    result == 0
}

/// Decode `Basic <base64(user:password)>`.
#[must_use]
pub fn extract_basic_credentials(auth_header: &str) -> Option<(String, String)> {
    let encoded = auth_header
        .strip_prefix("Basic ")
        .or_else(|| auth_header.strip_prefix("basic "))?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Validate authentication for an incoming request.
pub fn validate_request_auth(
    state: &ServerState,
    auth_header: Option<&str>,
) -> Result<(), ErrorResponse> {
    let (user, password) = auth_header
        .and_then(extract_basic_credentials)
        .ok_or_else(|| {
            ErrorResponse::new(
                error_codes::AUTH_FAILED,
                "Missing or invalid Authorization header",
            )
        })?;
    if !state.validate_auth(&user, &password) {
        return Err(ErrorResponse::new(
            error_codes::AUTH_FAILED,
            "Invalid credentials",
        ));
    }
    Ok(())
}

/// Handle the status endpoint.
#[must_use]
pub fn handle_status(state: &ServerState) -> StatusResponse {
    let certificate = state.orchestrator.signer().identity().certificate();
    StatusResponse {
        version: API_VERSION.to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        ready: true,
        signer_subject: certificate.subject().to_string(),
        signer_issuer: certificate.issuer().to_string(),
        max_concurrency: state.orchestrator.max_concurrency(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    }
}

/// Sign a batch request body.
///
/// 200 when every document was signed, 422 when some failed (the body then
/// carries `errors`), 400 for a body that is not a batch envelope.
pub async fn handle_sign(state: &ServerState, body: &[u8]) -> (StatusCode, warp::reply::Json) {
    let envelope = match std::str::from_utf8(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            let error =
                ErrorResponse::new(error_codes::BAD_REQUEST, format!("Body is not UTF-8: {e}"));
            return (StatusCode::BAD_REQUEST, warp::reply::json(&error));
        }
    };

    match state
        .orchestrator
        .sign_batch(envelope, state.shutdown.child_token())
        .await
    {
        Ok(report) => {
            let status = if report.is_complete() {
                StatusCode::OK
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            (status, warp::reply::json(&report.into_envelope()))
        }
        Err(e) => {
            log::warn!("Batch rejected: {}", e.chain_to_string());
            let status = match e {
                SigningError::InvalidDocumentFormat(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let error = ErrorResponse::new(e.code(), e.to_string());
            (status, warp::reply::json(&error))
        }
    }
}

/// Build all API routes.
pub fn routes(
    state: Arc<ServerState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    status_route(state.clone()).or(sign_route(state))
}

fn status_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "v1" / "status")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: Arc<ServerState>| warp::reply::json(&handle_status(&state)))
}

fn sign_route(
    state: Arc<ServerState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!("api" / "v1" / "sign")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and_then(handle_sign_request)
}

/// Inject state into handlers.
fn with_state(
    state: Arc<ServerState>,
) -> impl Filter<Extract = (Arc<ServerState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn handle_sign_request(
    auth: Option<String>,
    body: Bytes,
    state: Arc<ServerState>,
) -> Result<impl warp::Reply, Infallible> {
    if let Err(error) = validate_request_auth(&state, auth.as_deref()) {
        log::warn!("Rejected sign request: {}", error.message);
        return Ok(warp::reply::with_status(
            warp::reply::json(&error),
            StatusCode::UNAUTHORIZED,
        ));
    }

    log::debug!("Sign request: {} bytes", body.len());
    let (status, response) = handle_sign(&state, &body).await;
    Ok(warp::reply::with_status(response, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basic_credentials() {
        // "signer:s3cret"
        assert_eq!(
            extract_basic_credentials("Basic c2lnbmVyOnMzY3JldA=="),
            Some(("signer".to_string(), "s3cret".to_string()))
        );
        assert_eq!(extract_basic_credentials("Bearer abc"), None);
        assert_eq!(extract_basic_credentials("Basic !!!"), None);
        // no colon
        assert_eq!(extract_basic_credentials("Basic c2lnbmVy"), None);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let empty = sha256_hex(b"");
        assert_eq!(empty.len(), 64);
        assert_eq!(empty, empty.to_ascii_lowercase());
        assert!(empty.starts_with("e3b0c442"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
