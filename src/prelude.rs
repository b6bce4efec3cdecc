//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the saiten crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use saiten::prelude::*;
//!
//! # async fn run_example() -> Result<()> {
//! let raw = std::fs::read_to_string("path/to/flow.json")?;
//! let flow = FlowValidator::with_defaults().validate_str(&raw)?;
//!
//! let config = EngineConfig::default();
//! let interpreter = Interpreter::from_config(KindRegistry::with_builtins(), &config);
//! let payload = Payload::new(serde_json::json!({ "answer": "42" }));
//! let result = interpreter.evaluate(&flow, &payload).await?;
//!
//! println!("{:?}", Aggregator::aggregate(&result, flow.max_score()));
//! println!("{}", TraceFormatter::format_tree(&result));
//! # Ok(())
//! # }
//! ```

// Validation
pub use crate::schema::FlowValidator;
pub use crate::validate_flow;

// Definitions and payloads
pub use crate::flow::{Combinator, FlowDefinition, FlowNode, NodePath, Payload};

// Leaf kinds
pub use crate::kind::{ExternalKind, KindRegistry, LeafContext, LeafKind, LeafOutcome, Verifier};

// Evaluation and aggregation
pub use crate::interpreter::{Interpreter, NodeResult};
pub use crate::verdict::{Aggregator, Verdict, VerdictStatus};

// Submissions and coordination
pub use crate::coordinator::Coordinator;
pub use crate::submission::{
    InMemoryStore, NewSubmission, ScoringScope, Submission, SubmissionId, SubmissionStatus,
    SubmissionStore, SubmissionType,
};

// Configuration
pub use crate::config::EngineConfig;

// Error types
pub use crate::error::{CoordinatorError, EvaluationError, SchemaError, StoreError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
