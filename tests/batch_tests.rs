//! Batch signing: envelope handling, per-document isolation, concurrency bound and cancellation.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::cms_view::CmsView;
use common::identity::{test_provider, test_signer};
use eta_signer::adapters::keystore::SoftwareKeyProvider;
use eta_signer::infra::config::BatchConfig;
use eta_signer::{
    BatchOrchestrator, BatchReport, DigestAlgorithm, DocumentSigner, KeyProvider, ProviderError,
    SignatureAlgorithm, SigningError, SigningIdentity,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn envelope_json(report: BatchReport) -> Value {
    serde_json::from_str(&serde_json::to_string(&report.into_envelope()).unwrap()).unwrap()
}

fn orchestrator(signer: DocumentSigner, max_concurrency: usize, deadline_seconds: u64) -> BatchOrchestrator {
    BatchOrchestrator::new(
        Arc::new(signer),
        &BatchConfig {
            max_concurrency,
            deadline_seconds,
        },
    )
}

/// Software provider that sleeps inside `raw_sign` and records peak parallelism.
struct SlowProvider {
    inner: SoftwareKeyProvider,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowProvider {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: test_provider().0,
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

impl KeyProvider for SlowProvider {
    fn certificate(&self) -> Result<Vec<u8>, ProviderError> {
        self.inner.certificate()
    }

    fn raw_sign(&self, data: &[u8], algorithm: SignatureAlgorithm) -> Result<Vec<u8>, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        let signed = self.inner.raw_sign(data, algorithm);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        signed
    }
}

fn signer_over(provider: Arc<dyn KeyProvider>) -> DocumentSigner {
    DocumentSigner::new(SigningIdentity::acquire(provider).unwrap(), DigestAlgorithm::Sha256)
}

#[tokio::test]
async fn single_document_batch() {
    let batch = orchestrator(test_signer().signer, 4, 0);
    let report = batch
        .sign_batch(r#"{"documents":["{\"key\":\"value\"}"]}"#, CancellationToken::new())
        .await
        .unwrap();
    assert!(report.is_complete());

    let envelope = envelope_json(report);
    let object = envelope.as_object().unwrap();
    assert_eq!(object.keys().collect::<Vec<_>>(), vec!["documents"]);

    let documents = envelope["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["key"], "value");
    let signatures = documents[0]["signatures"].as_array().unwrap();
    assert_eq!(signatures.len(), 1);
    assert_eq!(signatures[0]["signatureType"], "I");

    let cms = CmsView::from_base64(signatures[0]["value"].as_str().unwrap());
    assert_eq!(cms.signed_data_version, 3);
    assert_eq!(cms.signer_info_version, 1);
}

#[tokio::test]
async fn failures_are_reported_per_document() {
    let batch = orchestrator(test_signer().signer, 2, 0);
    let envelope = json!({"documents": [
        "{\"a\":1}",
        "{not json",
        42,
        {"b": "inline"},
        "[1,2]",
        "{\"c\":3}"
    ]});
    let report = batch
        .sign_batch(&envelope.to_string(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total(), 6);
    assert!(!report.is_complete());
    let signed: Vec<usize> = report.signed().iter().map(|(i, _)| *i).collect();
    assert_eq!(signed, vec![0, 3, 5]);
    let failed: Vec<usize> = report.failures().iter().map(|f| f.index).collect();
    assert_eq!(failed, vec![1, 2, 4]);
    for failure in report.failures() {
        assert!(matches!(failure.error, SigningError::InvalidDocumentFormat(_)));
    }

    let envelope = envelope_json(report);
    let documents = envelope["documents"].as_array().unwrap();
    assert_eq!(documents[0]["a"], 1);
    assert_eq!(documents[1]["b"], "inline");
    assert_eq!(documents[2]["c"], 3);
    let errors = envelope["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0]["index"], 1);
    assert_eq!(errors[0]["code"], "INVALID_DOCUMENT_FORMAT");
    assert!(errors[0]["message"].as_str().unwrap().starts_with("Invalid document format"));
}

#[tokio::test]
async fn malformed_envelopes_fail_the_whole_batch() {
    let batch = orchestrator(test_signer().signer, 1, 0);
    for envelope in [
        r#"[{"a":1}]"#,
        r#"[["{\"a\":1}"]]"#,
        r#"{"docs":[]}"#,
        r#"{"documents":"{\"a\":1}"}"#,
        "null",
        "{broken",
    ] {
        let err = batch
            .sign_batch(envelope, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::InvalidDocumentFormat(_)));
    }
}

#[tokio::test]
async fn empty_batch_is_complete() {
    let batch = orchestrator(test_signer().signer, 1, 0);
    let report = batch
        .sign_batch(r#"{"documents":[]}"#, CancellationToken::new())
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(
        serde_json::to_string(&report.into_envelope()).unwrap(),
        r#"{"documents":[]}"#
    );
}

#[tokio::test]
async fn provider_failures_do_not_abort_the_batch() {
    struct BrokenToken(Vec<u8>);
    impl KeyProvider for BrokenToken {
        fn certificate(&self) -> Result<Vec<u8>, ProviderError> {
            Ok(self.0.clone())
        }
        fn raw_sign(&self, _: &[u8], _: SignatureAlgorithm) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::KeyUnusable("PIN blocked".into()))
        }
    }

    let (_, certificate) = test_provider();
    let provider = Arc::new(BrokenToken(certificate.to_der().unwrap()));
    let batch = orchestrator(signer_over(provider), 2, 0);
    let report = batch
        .sign_batch(r#"{"documents":["{\"a\":1}","{\"b\":2}"]}"#, CancellationToken::new())
        .await
        .unwrap();

    assert!(report.signed().is_empty());
    assert_eq!(report.failures().len(), 2);
    for failure in report.failures() {
        assert_eq!(failure.error.code(), "SIGNING_FAILURE");
        assert!(failure.error.chain_to_string().ends_with("key unusable: PIN blocked"));
    }
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let provider = SlowProvider::new(Duration::from_millis(50));
    let batch = orchestrator(signer_over(provider.clone()), 2, 0);
    let documents: Vec<Value> = (0..8).map(|i| json!({ "n": i })).collect();
    let report = batch
        .sign_batch(&json!({ "documents": documents }).to_string(), CancellationToken::new())
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.signed().len(), 8);
    let order: Vec<i64> = report
        .signed()
        .iter()
        .map(|(_, doc)| serde_json::from_str::<Value>(doc.get()).unwrap()["n"].as_i64().unwrap())
        .collect();
    assert_eq!(order, (0..8).collect::<Vec<_>>());
    assert!(provider.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn cancelled_batch_dispatches_nothing() {
    let batch = orchestrator(test_signer().signer, 2, 0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = batch
        .sign_batch(r#"{"documents":["{\"a\":1}",7,{"b":2}]}"#, cancel)
        .await
        .unwrap();

    assert!(report.signed().is_empty());
    let codes: Vec<(usize, &str)> = report
        .failures()
        .iter()
        .map(|f| (f.index, f.error.code()))
        .collect();
    assert_eq!(
        codes,
        vec![(0, "CANCELLED"), (1, "INVALID_DOCUMENT_FORMAT"), (2, "CANCELLED")]
    );
}

#[tokio::test]
async fn deadline_stops_dispatch_but_finishes_in_flight() {
    let provider = SlowProvider::new(Duration::from_millis(700));
    let batch = orchestrator(signer_over(provider), 1, 1);
    let documents: Vec<Value> = (0..5).map(|i| json!({ "n": i })).collect();
    let report = batch
        .sign_batch(&json!({ "documents": documents }).to_string(), CancellationToken::new())
        .await
        .unwrap();

    let signed: Vec<usize> = report.signed().iter().map(|(i, _)| *i).collect();
    assert_eq!(signed, vec![0, 1]);
    for failure in report.failures() {
        assert!(matches!(failure.error, SigningError::Cancelled(_)));
    }
    assert_eq!(report.failures().len(), 3);
}

#[tokio::test]
async fn signed_documents_keep_number_text() {
    let batch = orchestrator(test_signer().signer, 2, 0);
    let envelope = r#"{"documents":[{"A":1.0E+2,"q":[1E5,-0]},"{\"t\":100.50}"]}"#;
    let report = batch.sign_batch(envelope, CancellationToken::new()).await.unwrap();
    assert!(report.is_complete());

    let rendered = serde_json::to_string(&report.into_envelope()).unwrap();
    assert!(rendered.starts_with(r#"{"documents":[{"A":1.0E+2,"q":[1E5,-0],"signatures":"#));
    assert!(rendered.contains(r#"{"t":100.50,"signatures":"#));
}
