use super::NodeResult;
use crate::error::EvaluationError;
use crate::flow::{FlowNode, LeafNode, NodePath, Payload};
use crate::kind::{KindRegistry, LeafContext};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

type EngineFuture<'s> =
    Pin<Box<dyn Future<Output = Result<NodeResult, EvaluationError>> + Send + 's>>;

/// The core recursive engine for evaluating one node tree against one payload.
pub(super) struct FlowEngine<'a> {
    registry: &'a KindRegistry,
    payload: &'a Payload,
    verifier_timeout: Duration,
}

impl<'a> FlowEngine<'a> {
    pub(super) fn new(
        registry: &'a KindRegistry,
        payload: &'a Payload,
        verifier_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            payload,
            verifier_timeout,
        }
    }

    /// Evaluates the node and returns a result tree mirroring its structure.
    pub(super) async fn evaluate(
        &self,
        node: &FlowNode,
        path: NodePath,
    ) -> Result<NodeResult, EvaluationError> {
        self.evaluate_recursive(node, path).await
    }

    fn evaluate_recursive<'s>(&'s self, node: &'s FlowNode, path: NodePath) -> EngineFuture<'s> {
        Box::pin(async move {
            match node {
                FlowNode::Leaf(leaf) => self.evaluate_leaf(leaf, path).await,
                FlowNode::Flow {
                    combinator,
                    children,
                } => {
                    let mut results = Vec::with_capacity(children.len());
                    let mut stopped = false;

                    // Children run strictly in declaration order.
                    for (index, child) in children.iter().enumerate() {
                        let child_path = path.child(index);
                        if stopped {
                            results.push(NodeResult::Skipped {
                                path: child_path,
                                kind: child.kind().to_string(),
                                leaf_count: child.leaf_count(),
                            });
                            continue;
                        }
                        let result = self.evaluate_recursive(child, child_path).await?;
                        stopped = combinator.short_circuits() && !result.passed();
                        results.push(result);
                    }

                    let passed =
                        !stopped && combinator.combine(results.iter().map(NodeResult::passed));
                    Ok(NodeResult::Composite {
                        path,
                        combinator: *combinator,
                        passed,
                        children: results,
                    })
                }
            }
        })
    }

    async fn evaluate_leaf(
        &self,
        leaf: &LeafNode,
        path: NodePath,
    ) -> Result<NodeResult, EvaluationError> {
        let kind = self
            .registry
            .get(&leaf.kind)
            .ok_or_else(|| EvaluationError::UnregisteredKind {
                path: path.clone(),
                kind: leaf.kind.clone(),
            })?;

        let ctx = LeafContext {
            path: &path,
            verifier_timeout: self.verifier_timeout,
        };
        let outcome = kind.evaluate(&leaf.detail, self.payload, ctx).await?;
        debug!(path = %path, kind = %leaf.kind, passed = outcome.passed, "Evaluated leaf");

        Ok(NodeResult::Leaf {
            path,
            kind: leaf.kind.clone(),
            outcome,
        })
    }
}
