use crate::flow::{FLOW_KIND, NodePath};
use crate::submission::SubmissionId;
use thiserror::Error;

/// A mismatch between a leaf node's detail fields and the shape its kind expects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Errors that can occur while validating a raw flow definition.
///
/// Every variant identifies the offending node through its [`NodePath`]; the
/// root node has the empty path `""`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Failed to parse flow JSON: {0}")]
    JsonParse(String),

    #[error("Node at '{path}' must be a JSON object")]
    NotAnObject { path: NodePath },

    #[error("Node at '{path}' has no string 'kind' field")]
    MissingKind { path: NodePath },

    #[error("Root node must be of kind 'flow', but found '{found}'")]
    RootNotFlow { found: String },

    #[error("Node at '{path}' has an unregistered kind '{kind}'")]
    UnknownKind { path: NodePath, kind: String },

    #[error("Node at '{path}' of kind '{kind}' is malformed: {issue}")]
    InvalidDetail {
        path: NodePath,
        kind: String,
        issue: DetailError,
    },

    #[error("Composite node at '{path}' requires an ordered 'children' sequence")]
    MissingChildren { path: NodePath },

    #[error("Composite node at '{path}' has an unknown combinator '{found}'")]
    UnknownCombinator { path: NodePath, found: String },

    #[error("Node at '{path}' exceeds the maximum nesting depth of {max_depth}")]
    TooDeep { path: NodePath, max_depth: usize },
}

impl SchemaError {
    /// The breadcrumb path of the malformed node.
    pub fn path(&self) -> NodePath {
        match self {
            SchemaError::JsonParse(_) | SchemaError::RootNotFlow { .. } => NodePath::root(),
            SchemaError::NotAnObject { path }
            | SchemaError::MissingKind { path }
            | SchemaError::UnknownKind { path, .. }
            | SchemaError::InvalidDetail { path, .. }
            | SchemaError::MissingChildren { path }
            | SchemaError::UnknownCombinator { path, .. }
            | SchemaError::TooDeep { path, .. } => path.clone(),
        }
    }

    /// The kind whose shape the node failed to match, when one is known.
    pub fn expected_kind(&self) -> Option<&str> {
        match self {
            SchemaError::RootNotFlow { .. }
            | SchemaError::MissingChildren { .. }
            | SchemaError::UnknownCombinator { .. } => Some(FLOW_KIND),
            SchemaError::InvalidDetail { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Errors raised by an out-of-process verifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("verifier unavailable: {0}")]
    Unavailable(String),

    #[error("verifier returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Internal faults raised while evaluating a validated flow.
///
/// Timeouts are not errors: a timed-out leaf is recorded as a failed node.
#[derive(Error, Debug, Clone)]
pub enum EvaluationError {
    #[error("Verifier for kind '{kind}' failed at node '{path}': {source}")]
    Verifier {
        path: NodePath,
        kind: String,
        #[source]
        source: VerifierError,
    },

    #[error("Node at '{path}' has kind '{kind}', which is not registered in this engine")]
    UnregisteredKind { path: NodePath, kind: String },

    #[error("Leaf evaluator at '{path}' failed: {message}")]
    Leaf { path: NodePath, message: String },

    #[error("Evaluation task aborted: {0}")]
    Aborted(String),
}

/// Errors reported by a [`SubmissionStore`](crate::submission::SubmissionStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Submission '{0}' not found")]
    SubmissionNotFound(SubmissionId),

    #[error("No flow definition has been published for challenge '{challenge_id}'")]
    FlowNotFound { challenge_id: String },

    #[error("Flow version {version} of challenge '{challenge_id}' not found")]
    FlowVersionNotFound { challenge_id: String, version: u64 },

    #[error("Submission '{0}' already has a terminal verdict")]
    AlreadyTerminal(SubmissionId),

    #[error("Submission '{0}' is no longer pending")]
    NotPending(SubmissionId),

    #[error("Persistence operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the [`Coordinator`](crate::coordinator::Coordinator).
///
/// Cloneable so that every caller waiting on one evaluation receives its outcome.
#[derive(Error, Debug, Clone)]
pub enum CoordinatorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Submission '{0}' was withdrawn")]
    Withdrawn(SubmissionId),

    #[error("Submission '{0}' has already been claimed for evaluation")]
    AlreadyClaimed(SubmissionId),

    #[error("Evaluation of submission '{0}' ended without an outcome")]
    Abandoned(SubmissionId),

    #[error(
        "Submission '{submission_id}' is pinned to flow version {expected}, but version {found} was supplied"
    )]
    FlowVersionMismatch {
        submission_id: SubmissionId,
        expected: u64,
        found: u64,
    },
}

/// Errors that can occur while loading an [`EngineConfig`](crate::config::EngineConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
