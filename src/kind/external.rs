use super::{LeafContext, LeafKind, LeafOutcome};
use crate::error::{DetailError, EvaluationError, VerifierError};
use crate::flow::Payload;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// An out-of-process checker, such as a code runner or a remote judge.
///
/// `timeout` is the deadline the engine enforces on the call; implementations
/// may forward it to their transport.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        detail: &Map<String, Value>,
        payload: &Payload,
        timeout: Duration,
    ) -> Result<bool, VerifierError>;
}

/// A leaf kind whose check is delegated to a [`Verifier`].
///
/// Schema validation only checks that the declared required fields are present;
/// their meaning belongs to the verifier.
pub struct ExternalKind {
    name: String,
    required_fields: Vec<String>,
    verifier: Arc<dyn Verifier>,
}

impl ExternalKind {
    pub fn new(name: impl Into<String>, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            name: name.into(),
            required_fields: Vec::new(),
            verifier,
        }
    }

    pub fn require_field(mut self, field: impl Into<String>) -> Self {
        self.required_fields.push(field.into());
        self
    }
}

#[async_trait]
impl LeafKind for ExternalKind {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_schema(&self, detail: &Map<String, Value>) -> Result<(), DetailError> {
        match self
            .required_fields
            .iter()
            .find(|field| !detail.contains_key(field.as_str()))
        {
            Some(missing) => Err(DetailError::MissingField(missing.clone())),
            None => Ok(()),
        }
    }

    async fn evaluate(
        &self,
        detail: &Map<String, Value>,
        payload: &Payload,
        ctx: LeafContext<'_>,
    ) -> Result<LeafOutcome, EvaluationError> {
        let call = self.verifier.verify(detail, payload, ctx.verifier_timeout);
        match tokio::time::timeout(ctx.verifier_timeout, call).await {
            Ok(Ok(true)) => Ok(LeafOutcome::pass()),
            Ok(Ok(false)) => Ok(LeafOutcome::fail("rejected by verifier")),
            Ok(Err(source)) => Err(EvaluationError::Verifier {
                path: ctx.path.clone(),
                kind: self.name.clone(),
                source,
            }),
            Err(_) => {
                let timeout_ms =
                    u64::try_from(ctx.verifier_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(
                    kind = %self.name,
                    path = %ctx.path,
                    timeout_ms,
                    "Verifier call timed out"
                );
                Ok(LeafOutcome::timed_out(ctx.verifier_timeout))
            }
        }
    }
}
