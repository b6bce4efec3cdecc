use super::{Combinator, FlowNode};
use std::sync::Arc;

/// The score awarded for a fully correct submission when the challenge sets none.
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

/// A validated, immutable flow definition.
///
/// Only [`FlowValidator`](crate::schema::FlowValidator) can produce one, so the root
/// node is always a `flow` composite. The node tree sits behind an [`Arc`]: clones
/// are cheap and every submission evaluated against the same version reads the
/// same tree without locking.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    root: Arc<FlowNode>,
    leaf_count: usize,
    max_score: f64,
    version: u64,
}

impl FlowDefinition {
    pub(crate) fn from_validated(root: FlowNode, max_score: f64) -> Self {
        let leaf_count = root.leaf_count();
        Self {
            root: Arc::new(root),
            leaf_count,
            max_score,
            version: 0,
        }
    }

    pub fn root(&self) -> &FlowNode {
        &self.root
    }

    pub fn combinator(&self) -> Combinator {
        match self.root.as_ref() {
            FlowNode::Flow { combinator, .. } => *combinator,
            FlowNode::Leaf(_) => Combinator::All,
        }
    }

    pub fn children(&self) -> &[FlowNode] {
        match self.root.as_ref() {
            FlowNode::Flow { children, .. } => children,
            FlowNode::Leaf(_) => &[],
        }
    }

    /// The number of leaf criteria in the definition.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn max_score(&self) -> f64 {
        self.max_score
    }

    /// The version assigned when the definition was published; `0` if unpublished.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the score awarded for a fully correct submission.
    pub fn with_max_score(mut self, max_score: f64) -> Self {
        self.max_score = max_score;
        self
    }

    /// Stamps the definition with its published version.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Whether both definitions read the same node tree.
    pub fn shares_tree_with(&self, other: &FlowDefinition) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}
