//! `BatchOrchestrator`: signs every document of a batch envelope.
//!
//! Documents are independent. Each one is signed on the blocking pool (the
//! key provider may block on a token round trip) with at most
//! `max_concurrency` in flight. A failure only affects its own document; the
//! report lists signed documents in input order plus one entry per failed
//! index. Cancellation, or the configured deadline, stops dispatch: documents
//! not yet started are reported as `Cancelled`, in-flight ones finish.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::value::RawValue;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::domain::constants;
use crate::domain::document::{BatchErrorEntry, SignBatchResponse};
use crate::domain::json::{JsonKind, RawObject};
use crate::infra::config::BatchConfig;
use crate::infra::error::{SigningError, SigningResult};
use crate::pipelines::sign::DocumentSigner;

/// Failure of one batch element.
#[derive(Debug)]
pub struct DocumentFailure {
    pub index: usize,
    pub error: SigningError,
}

impl DocumentFailure {
    #[must_use]
    pub fn to_entry(&self) -> BatchErrorEntry {
        BatchErrorEntry {
            index: self.index,
            code: self.error.code().to_string(),
            message: self.error.to_string(),
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    signed: Vec<(usize, Box<RawValue>)>,
    failures: Vec<DocumentFailure>,
}

impl BatchReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.signed.len() + self.failures.len()
    }

    /// Whether every document was signed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Signed documents in input order, with their input index.
    #[must_use]
    pub fn signed(&self) -> &[(usize, Box<RawValue>)] {
        &self.signed
    }

    /// Failures in input order.
    #[must_use]
    pub fn failures(&self) -> &[DocumentFailure] {
        &self.failures
    }

    /// `{"documents":[...]}`, plus `"errors":[...]` when anything failed.
    #[must_use]
    pub fn into_envelope(self) -> SignBatchResponse {
        SignBatchResponse {
            errors: self.failures.iter().map(DocumentFailure::to_entry).collect(),
            documents: self.signed.into_iter().map(|(_, document)| document).collect(),
        }
    }

    fn finish(mut self) -> Self {
        self.signed.sort_by_key(|(index, _)| *index);
        self.failures.sort_by_key(|f| f.index);
        self
    }
}

/// Extract the `documents` array of a batch envelope.
///
/// This is the only whole-batch failure: anything but an object holding a
/// `documents` array is `InvalidDocumentFormat`.
pub fn envelope_documents(envelope: &str) -> SigningResult<Vec<Box<RawValue>>> {
    let fields = RawObject::parse(envelope)?;
    let Some(documents) = fields.get(constants::DOCUMENTS_KEY) else {
        return Err(SigningError::InvalidDocumentFormat(format!(
            "batch envelope has no '{}' array",
            constants::DOCUMENTS_KEY
        )));
    };
    match JsonKind::of(documents) {
        JsonKind::Array => Ok(serde_json::from_str(documents.get())?),
        other => Err(SigningError::InvalidDocumentFormat(format!(
            "'{}' must be an array, got {other}",
            constants::DOCUMENTS_KEY
        ))),
    }
}

/// A batch element is either document text or an inline object.
fn decode_element(element: &RawValue) -> SigningResult<RawObject> {
    match JsonKind::of(element) {
        JsonKind::String => {
            let text: String = serde_json::from_str(element.get())?;
            RawObject::parse(&text)
        }
        JsonKind::Object => RawObject::from_raw(element),
        other => Err(SigningError::InvalidDocumentFormat(format!(
            "a batch element must be a JSON object or document text, got {other}"
        ))),
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

pub struct BatchOrchestrator {
    signer: Arc<DocumentSigner>,
    max_concurrency: usize,
    deadline: Option<Duration>,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(signer: Arc<DocumentSigner>, config: &BatchConfig) -> Self {
        Self {
            signer,
            max_concurrency: config.max_concurrency.max(1),
            deadline: config.deadline(),
        }
    }

    #[must_use]
    pub fn signer(&self) -> &Arc<DocumentSigner> {
        &self.signer
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Sign every document of `envelope`.
    pub async fn sign_batch(
        &self,
        envelope: &str,
        cancel: CancellationToken,
    ) -> SigningResult<BatchReport> {
        let elements = envelope_documents(envelope)?;
        let total = elements.len();
        log::info!(
            "Signing batch of {total} documents (max concurrency {})",
            self.max_concurrency
        );

        let deadline = self.deadline.map(|d| Instant::now() + d);
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();
        let mut report = BatchReport::default();

        for (index, element) in elements.into_iter().enumerate() {
            let document = match decode_element(&element) {
                Ok(document) => document,
                Err(error) => {
                    log::warn!("Document {index} rejected: {}", error.chain_to_string());
                    report.failures.push(DocumentFailure { index, error });
                    continue;
                }
            };

            let permit = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                () = deadline_elapsed(deadline) => {
                    log::warn!("Batch deadline reached; dispatch stopped");
                    cancel.cancel();
                    None
                }
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.failures.push(DocumentFailure {
                    index,
                    error: SigningError::Cancelled(format!(
                        "document {index} was not dispatched before cancellation"
                    )),
                });
                continue;
            };

            let signer = Arc::clone(&self.signer);
            pending.insert(index);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                log::debug!("Signing document {index}");
                let signed = signer
                    .sign_fields(document)
                    .and_then(|signed| signed.to_raw());
                (index, signed)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => {
                    pending.remove(&index);
                    match result {
                        Ok(signed) => report.signed.push((index, signed)),
                        Err(error) => {
                            log::warn!(
                                "Document {index} failed: {}",
                                error.chain_to_string()
                            );
                            report.failures.push(DocumentFailure { index, error });
                        }
                    }
                }
                Err(join_error) => log::warn!("Signing task aborted: {join_error}"),
            }
        }
        // tasks that panicked never reported their index
        for index in pending {
            report.failures.push(DocumentFailure {
                index,
                error: SigningError::signing_failure_msg("signing task terminated abnormally"),
            });
        }

        let report = report.finish();
        log::info!(
            "Batch finished: {} of {} signed, {} failed",
            report.signed.len(),
            total,
            report.failures.len()
        );
        Ok(report)
    }
}
