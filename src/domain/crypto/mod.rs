//! Cryptographic domain types.
//!
//! Strongly-typed wrappers for digests, signature algorithms, raw signature
//! values and the signer certificate.

mod cert;
mod digest;
mod signature;

pub use cert::SignerCertificate;
pub use digest::{DigestAlgorithm, DigestBytes};
pub use signature::{CmsSignature, SignatureAlgorithm};
