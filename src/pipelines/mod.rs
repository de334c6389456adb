//! Workflow pipelines orchestrating stateless services.

pub mod batch;
pub mod sign;

pub use batch::{envelope_documents, BatchOrchestrator, BatchReport, DocumentFailure};
pub use sign::DocumentSigner;
