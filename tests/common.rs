//! Common test utilities for building flow definitions, verifiers and coordinators.
use async_trait::async_trait;
use saiten::error::{DetailError, EvaluationError, VerifierError};
use saiten::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A `string` leaf comparing the default answer field.
#[allow(dead_code)]
pub fn string_leaf(expected: &str) -> Value {
    json!({ "kind": "string", "expected": expected })
}

/// A `string` leaf comparing a named field or JSON pointer.
#[allow(dead_code)]
pub fn string_leaf_at(field: &str, expected: &str) -> Value {
    json!({ "kind": "string", "field": field, "expected": expected })
}

/// A composite node with the default combinator.
#[allow(dead_code)]
pub fn flow(children: Vec<Value>) -> Value {
    json!({ "kind": "flow", "children": children })
}

/// A composite node with an explicit combinator.
#[allow(dead_code)]
pub fn flow_with(combinator: &str, children: Vec<Value>) -> Value {
    json!({ "kind": "flow", "combinator": combinator, "children": children })
}

/// Logic: `answer == "42"`
#[allow(dead_code)]
pub fn answer_flow() -> FlowDefinition {
    validate_flow(&flow(vec![string_leaf("42")])).expect("answer flow is valid")
}

#[allow(dead_code)]
pub fn answer_payload(answer: &str) -> Payload {
    Payload::new(json!({ "answer": answer }))
}

#[allow(dead_code)]
pub fn new_submission(
    challenge_id: &str,
    submission_type: SubmissionType,
    payload: Payload,
) -> NewSubmission {
    NewSubmission {
        challenge_id: challenge_id.to_string(),
        user_id: "learner-1".to_string(),
        submission_type,
        payload,
    }
}

/// Verifier that passes when the payload's `answer` equals the detail's `expected`,
/// counting how many times it was called and optionally sleeping first.
#[allow(dead_code)]
pub struct CountingVerifier {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

#[allow(dead_code)]
impl CountingVerifier {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Verifier for CountingVerifier {
    async fn verify(
        &self,
        detail: &Map<String, Value>,
        payload: &Payload,
        _timeout: Duration,
    ) -> std::result::Result<bool, VerifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(detail.get("expected") == payload.field("answer"))
    }
}

/// Verifier that never answers within any reasonable deadline.
#[allow(dead_code)]
pub struct HangingVerifier;

#[async_trait]
impl Verifier for HangingVerifier {
    async fn verify(
        &self,
        _detail: &Map<String, Value>,
        _payload: &Payload,
        _timeout: Duration,
    ) -> std::result::Result<bool, VerifierError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(true)
    }
}

/// Verifier whose backend is always down.
#[allow(dead_code)]
pub struct FailingVerifier;

#[async_trait]
impl Verifier for FailingVerifier {
    async fn verify(
        &self,
        _detail: &Map<String, Value>,
        _payload: &Payload,
        _timeout: Duration,
    ) -> std::result::Result<bool, VerifierError> {
        Err(VerifierError::Unavailable(
            "connection refused by sandbox-7.internal".to_string(),
        ))
    }
}

/// A leaf kind whose evaluator panics.
#[allow(dead_code)]
pub struct PanickingKind;

#[async_trait]
impl LeafKind for PanickingKind {
    fn name(&self) -> &str {
        "panic"
    }

    fn check_schema(&self, _detail: &Map<String, Value>) -> std::result::Result<(), DetailError> {
        Ok(())
    }

    async fn evaluate(
        &self,
        _detail: &Map<String, Value>,
        _payload: &Payload,
        _ctx: LeafContext<'_>,
    ) -> std::result::Result<LeafOutcome, EvaluationError> {
        panic!("evaluator bug");
    }
}

/// A registry with the built-ins plus `remote` (counting), `hang`, `broken` and `panic`.
#[allow(dead_code)]
pub fn test_registry(counting: Arc<CountingVerifier>) -> Arc<KindRegistry> {
    KindRegistry::builder()
        .with_kind(Arc::new(
            ExternalKind::new("remote", counting).require_field("expected"),
        ))
        .with_kind(Arc::new(ExternalKind::new("hang", Arc::new(HangingVerifier))))
        .with_kind(Arc::new(ExternalKind::new("broken", Arc::new(FailingVerifier))))
        .with_kind(Arc::new(PanickingKind))
        .build()
}

#[allow(dead_code)]
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .with_verifier_timeout(Duration::from_millis(200))
        .with_persistence_timeout(Duration::from_secs(1))
}

/// Store whose first verdict write fails; everything else goes to an in-memory store.
#[allow(dead_code)]
pub struct FlakyStore {
    pub inner: Arc<InMemoryStore>,
    failed_once: AtomicBool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failed_once: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl SubmissionStore for FlakyStore {
    async fn create_submission(
        &self,
        new: NewSubmission,
    ) -> std::result::Result<SubmissionId, StoreError> {
        self.inner.create_submission(new).await
    }

    async fn get_submission(&self, id: SubmissionId) -> std::result::Result<Submission, StoreError> {
        self.inner.get_submission(id).await
    }

    async fn delete_pending(&self, id: SubmissionId) -> std::result::Result<(), StoreError> {
        self.inner.delete_pending(id).await
    }

    async fn publish_flow(
        &self,
        challenge_id: &str,
        flow: FlowDefinition,
    ) -> std::result::Result<FlowDefinition, StoreError> {
        self.inner.publish_flow(challenge_id, flow).await
    }

    async fn get_flow_definition(
        &self,
        challenge_id: &str,
    ) -> std::result::Result<FlowDefinition, StoreError> {
        self.inner.get_flow_definition(challenge_id).await
    }

    async fn flow_definition_at(
        &self,
        challenge_id: &str,
        version: u64,
    ) -> std::result::Result<FlowDefinition, StoreError> {
        self.inner.flow_definition_at(challenge_id, version).await
    }

    async fn write_verdict(
        &self,
        id: SubmissionId,
        verdict: &Verdict,
        scope: ScoringScope,
    ) -> std::result::Result<(), StoreError> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.inner.write_verdict(id, verdict, scope).await
    }
}

/// A coordinator over a fresh in-memory store, with the test kinds registered.
#[allow(dead_code)]
pub struct Harness {
    pub coordinator: Coordinator,
    pub store: Arc<InMemoryStore>,
    pub registry: Arc<KindRegistry>,
    pub verifier: Arc<CountingVerifier>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_verifier(CountingVerifier::new())
    }

    pub fn with_verifier(verifier: Arc<CountingVerifier>) -> Self {
        Self::with_config(verifier, test_config())
    }

    pub fn with_config(verifier: Arc<CountingVerifier>, config: EngineConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let registry = test_registry(verifier.clone());
        let coordinator = Coordinator::new(store.clone(), registry.clone(), config);
        Self {
            coordinator,
            store,
            registry,
            verifier,
        }
    }

    /// Validates `raw` against the test kinds and publishes it under `challenge_id`.
    pub async fn publish(&self, challenge_id: &str, raw: Value) -> FlowDefinition {
        let definition = FlowValidator::builder(self.registry.clone())
            .build()
            .validate(&raw)
            .expect("test flow is valid");
        self.store
            .publish_flow(challenge_id, definition)
            .await
            .expect("publish flow")
    }

    /// Enqueues a submission and returns the stored pending record.
    pub async fn enqueue(
        &self,
        challenge_id: &str,
        submission_type: SubmissionType,
        payload: Payload,
    ) -> Submission {
        let id = self
            .coordinator
            .enqueue(new_submission(challenge_id, submission_type, payload))
            .await
            .expect("enqueue submission");
        self.store.get_submission(id).await.expect("submission exists")
    }
}
