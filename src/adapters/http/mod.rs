//! REST transport for batch signing.
//!
//! - `POST /api/v1/sign`: basic auth, body is a batch envelope
//! - `GET /api/v1/status`: unauthenticated health check

pub mod protocol;
pub mod server;

pub use server::{routes, ServerState};
