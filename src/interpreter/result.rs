use crate::flow::{Combinator, NodePath};
use crate::kind::LeafOutcome;

/// A record of how one node was evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeResult {
    Leaf {
        path: NodePath,
        kind: String,
        outcome: LeafOutcome,
    },
    Composite {
        path: NodePath,
        combinator: Combinator,
        passed: bool,
        children: Vec<NodeResult>,
    },
    /// A node left unevaluated because a `failFast` sibling failed before it.
    Skipped {
        path: NodePath,
        kind: String,
        leaf_count: usize,
    },
}

/// Passed and total leaf counts of a result tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafTally {
    pub passed: usize,
    pub total: usize,
}

impl LeafTally {
    /// `passed / total`, or `1.0` for a tree without leaves.
    pub fn correct_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.passed as f64 / self.total as f64
        }
    }
}

impl NodeResult {
    pub fn passed(&self) -> bool {
        match self {
            NodeResult::Leaf { outcome, .. } => outcome.passed,
            NodeResult::Composite { passed, .. } => *passed,
            NodeResult::Skipped { .. } => false,
        }
    }

    pub fn path(&self) -> &NodePath {
        match self {
            NodeResult::Leaf { path, .. }
            | NodeResult::Composite { path, .. }
            | NodeResult::Skipped { path, .. } => path,
        }
    }

    /// Counts the leaves under this result. Skipped leaves count as not passed.
    pub fn leaf_tally(&self) -> LeafTally {
        match self {
            NodeResult::Leaf { outcome, .. } => LeafTally {
                passed: usize::from(outcome.passed),
                total: 1,
            },
            NodeResult::Skipped { leaf_count, .. } => LeafTally {
                passed: 0,
                total: *leaf_count,
            },
            NodeResult::Composite { children, .. } => {
                children
                    .iter()
                    .map(NodeResult::leaf_tally)
                    .fold(LeafTally::default(), |acc, tally| LeafTally {
                        passed: acc.passed + tally.passed,
                        total: acc.total + tally.total,
                    })
            }
        }
    }

    /// The first leaf, in declaration order, that did not pass.
    ///
    /// A skipped subtree that contains leaves counts as a non-passing leaf.
    pub fn first_failure(&self) -> Option<&NodeResult> {
        match self {
            NodeResult::Leaf { outcome, .. } if !outcome.passed => Some(self),
            NodeResult::Skipped { leaf_count, .. } if *leaf_count > 0 => Some(self),
            NodeResult::Composite { children, .. } => {
                children.iter().find_map(NodeResult::first_failure)
            }
            _ => None,
        }
    }
}
