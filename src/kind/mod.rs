use crate::error::{DetailError, EvaluationError};
use crate::flow::{NodePath, Payload};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

mod external;
mod registry;
mod string;

pub use external::{ExternalKind, Verifier};
pub use registry::{KindRegistry, KindRegistryBuilder};
pub use string::{DEFAULT_ANSWER_FIELD, StringKind};

/// Per-leaf information the interpreter hands to a [`LeafKind`].
#[derive(Debug, Clone, Copy)]
pub struct LeafContext<'a> {
    pub path: &'a NodePath,
    /// Deadline for any out-of-process call the kind makes.
    pub verifier_timeout: Duration,
}

/// The outcome of evaluating one leaf criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafOutcome {
    pub passed: bool,
    /// Learner-facing feedback. Must not reveal the expected answer.
    pub message: Option<String>,
    pub timed_out: bool,
}

impl LeafOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
            timed_out: false,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            timed_out: false,
        }
    }

    pub fn timed_out(after: Duration) -> Self {
        Self {
            passed: false,
            message: Some(format!("timed out after {}ms", after.as_millis())),
            timed_out: true,
        }
    }
}

/// Defines the contract for a leaf node kind: how its detail fields are
/// validated and how a payload is checked against them.
///
/// Implementations are registered once in a [`KindRegistry`] and shared by every
/// evaluation, so they must not keep per-evaluation state.
#[async_trait]
pub trait LeafKind: Send + Sync {
    /// The kind name used in flow definitions.
    fn name(&self) -> &str;

    /// Validates the detail fields of a node of this kind.
    fn check_schema(&self, detail: &Map<String, Value>) -> Result<(), DetailError>;

    /// Evaluates a validated node of this kind against a payload.
    async fn evaluate(
        &self,
        detail: &Map<String, Value>,
        payload: &Payload,
        ctx: LeafContext<'_>,
    ) -> Result<LeafOutcome, EvaluationError>;
}

/// Helper to read a required string field from a leaf's detail.
pub(crate) fn require_str<'d>(
    detail: &'d Map<String, Value>,
    field: &str,
) -> Result<&'d str, DetailError> {
    match detail.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(DetailError::WrongType {
            field: field.to_string(),
            expected: "a string",
        }),
        None => Err(DetailError::MissingField(field.to_string())),
    }
}

/// Helper to read an optional string field from a leaf's detail.
pub(crate) fn optional_str<'d>(
    detail: &'d Map<String, Value>,
    field: &str,
) -> Result<Option<&'d str>, DetailError> {
    match detail.get(field) {
        None => Ok(None),
        Some(_) => require_str(detail, field).map(Some),
    }
}
