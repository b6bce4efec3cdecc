use crate::config::EngineConfig;
use crate::error::EvaluationError;
use crate::flow::{FlowDefinition, FlowNode, NodePath, Payload};
use crate::kind::KindRegistry;
use std::sync::Arc;
use std::time::Duration;

mod engine;
mod result;

use engine::FlowEngine;
pub use result::{LeafTally, NodeResult};

/// Evaluates validated flow definitions against submission payloads.
///
/// The result depends only on the definition and the payload: children run in
/// declaration order, built-in kinds perform no I/O, and no state is shared
/// between evaluations. An `Interpreter` is cheap to clone and can be used
/// concurrently from many tasks.
#[derive(Clone)]
pub struct Interpreter {
    registry: Arc<KindRegistry>,
    verifier_timeout: Duration,
}

impl Interpreter {
    pub fn new(registry: Arc<KindRegistry>, verifier_timeout: Duration) -> Self {
        Self {
            registry,
            verifier_timeout,
        }
    }

    pub fn from_config(registry: Arc<KindRegistry>, config: &EngineConfig) -> Self {
        Self::new(registry, config.verifier_timeout())
    }

    pub fn registry(&self) -> &Arc<KindRegistry> {
        &self.registry
    }

    /// Evaluates a whole definition.
    ///
    /// Timed-out leaves are reported as failed nodes; only internal faults
    /// (verifier errors, malformed leaves, unregistered kinds) are returned as errors.
    pub async fn evaluate(
        &self,
        flow: &FlowDefinition,
        payload: &Payload,
    ) -> Result<NodeResult, EvaluationError> {
        self.evaluate_node(flow.root(), payload).await
    }

    /// Evaluates a single node as if it were the root.
    pub async fn evaluate_node(
        &self,
        node: &FlowNode,
        payload: &Payload,
    ) -> Result<NodeResult, EvaluationError> {
        let engine = FlowEngine::new(&self.registry, payload, self.verifier_timeout);
        engine.evaluate(node, NodePath::root()).await
    }
}
