//! # Saiten - Flow Grading Validation and Execution Engine
//!
//! **Saiten** grades learner submissions against challenge definitions expressed as
//! trees of checks. A definition is validated once when it is authored, then
//! evaluated against every submission payload to produce a persisted verdict with a
//! score and a correct rate.
//!
//! ## Core Workflow
//!
//! 1.  **Validate**: Turn a raw JSON definition into a [`FlowDefinition`](flow::FlowDefinition)
//!     with [`validate_flow`] or a [`FlowValidator`](schema::FlowValidator) built on a custom
//!     [`KindRegistry`](kind::KindRegistry). Malformed definitions are rejected with a
//!     [`SchemaError`](error::SchemaError) that points at the offending node.
//! 2.  **Evaluate**: The [`Interpreter`](interpreter::Interpreter) walks the definition against
//!     a payload and returns a result tree.
//! 3.  **Aggregate**: The [`Aggregator`](verdict::Aggregator) reduces the result tree to a
//!     [`Verdict`](verdict::Verdict).
//! 4.  **Coordinate**: The [`Coordinator`](coordinator::Coordinator) ties the steps together for
//!     a stored submission: it claims the submission, evaluates it once, and writes the
//!     verdict through a [`SubmissionStore`](submission::SubmissionStore).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use saiten::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let flow = validate_flow(&json!({
//!     "kind": "flow",
//!     "children": [{ "kind": "string", "expected": "42" }]
//! }))?;
//!
//! let store = Arc::new(InMemoryStore::new());
//! store.publish_flow("challenge-1", flow).await?;
//!
//! let coordinator = Coordinator::new(
//!     store.clone(),
//!     KindRegistry::with_builtins(),
//!     EngineConfig::default(),
//! );
//! let id = coordinator
//!     .enqueue(NewSubmission {
//!         challenge_id: "challenge-1".to_string(),
//!         user_id: "user-1".to_string(),
//!         submission_type: SubmissionType::Execute,
//!         payload: Payload::new(json!({ "answer": "42" })),
//!     })
//!     .await?;
//!
//! let verdict = coordinator.dispatch(id).await?;
//! assert!(verdict.is_passed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod flow;
pub mod interpreter;
pub mod kind;
pub mod prelude;
pub mod schema;
pub mod submission;
pub mod trace;
pub mod verdict;

use error::SchemaError;
use flow::FlowDefinition;
use schema::FlowValidator;
use serde_json::Value;

/// Validates a raw definition against the built-in kinds and default limits.
pub fn validate_flow(raw: &Value) -> Result<FlowDefinition, SchemaError> {
    FlowValidator::with_defaults().validate(raw)
}
