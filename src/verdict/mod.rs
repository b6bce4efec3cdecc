use crate::interpreter::{LeafTally, NodeResult};
use serde::{Deserialize, Serialize};

/// The terminal outcome of a graded submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerdictStatus {
    Failed,
    Passed,
}

/// The persisted result of one submission: written back exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub status: VerdictStatus,
    pub score: f64,
    pub correct_rate: f64,
    pub message: String,
}

impl Verdict {
    /// The verdict recorded when evaluation faulted. Carries no fault details.
    pub fn internal_failure(message: impl Into<String>) -> Self {
        Self {
            status: VerdictStatus::Failed,
            score: 0.0,
            correct_rate: 0.0,
            message: message.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == VerdictStatus::Passed
    }
}

/// Reduces an evaluation result tree into a [`Verdict`].
pub struct Aggregator;

impl Aggregator {
    /// Computes the verdict for a result tree.
    ///
    /// `correct_rate` is the fraction of leaves that passed, `1.0` when there are
    /// no leaves. The submission passes only when every leaf passed, regardless of
    /// the root combinator. The score is not rounded.
    pub fn aggregate(root: &NodeResult, max_score: f64) -> Verdict {
        let tally = root.leaf_tally();
        let correct_rate = tally.correct_rate();
        let status = if tally.passed == tally.total {
            VerdictStatus::Passed
        } else {
            VerdictStatus::Failed
        };

        let message = match status {
            VerdictStatus::Passed => String::new(),
            VerdictStatus::Failed => Self::summarize(root, tally),
        };

        Verdict {
            status,
            score: correct_rate * max_score,
            correct_rate,
            message,
        }
    }

    /// Summarizes a failing result: the tally and where the first failure is.
    fn summarize(root: &NodeResult, tally: LeafTally) -> String {
        let mut message = format!("{}/{} checks passed", tally.passed, tally.total);
        match root.first_failure() {
            Some(NodeResult::Leaf { path, kind, outcome }) => {
                message.push_str(&format!("; first failing check at {} ({})", path, kind));
                if outcome.timed_out {
                    message.push_str(": timed out");
                }
            }
            Some(NodeResult::Skipped { path, kind, .. }) => {
                message.push_str(&format!(
                    "; first failing check at {} ({}); remaining checks skipped",
                    path, kind
                ));
            }
            _ => {}
        }
        message
    }
}
