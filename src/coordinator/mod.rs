//! Submission lifecycle: claim, evaluate, aggregate, persist.
//!
//! A submission moves from `pending` to exactly one of `passed` or `failed`.
//! The [`Coordinator`] guarantees that at most one evaluation of a submission
//! produces its verdict, that every claimed submission reaches a persisted
//! terminal state even when evaluation faults, and that asking again for a
//! finished submission returns the stored verdict without re-running any check.

use crate::config::EngineConfig;
use crate::error::{CoordinatorError, EvaluationError, StoreError};
use crate::flow::FlowDefinition;
use crate::interpreter::{Interpreter, NodeResult};
use crate::kind::KindRegistry;
use crate::submission::{NewSubmission, Submission, SubmissionId, SubmissionStore};
use crate::verdict::{Aggregator, Verdict};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, error, info, instrument, warn};

mod claim;

use claim::{ClaimTable, Ticket};

/// Drives submissions through the interpreter and aggregator and persists their verdicts.
///
/// Cloning is cheap; clones share the claim table, so they coordinate with each other.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<dyn SubmissionStore>,
    interpreter: Interpreter,
    claims: Arc<ClaimTable>,
    config: Arc<EngineConfig>,
}

impl Coordinator {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        registry: Arc<KindRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            interpreter: Interpreter::from_config(registry, &config),
            claims: Arc::new(ClaimTable::default()),
            config: Arc::new(config),
        }
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of submissions currently being evaluated.
    pub fn in_flight(&self) -> usize {
        self.claims.in_flight()
    }

    /// Persists a new pending submission pinned to the latest flow version.
    pub async fn enqueue(&self, new: NewSubmission) -> Result<SubmissionId, CoordinatorError> {
        let id = self
            .persist("create_submission", self.store.create_submission(new))
            .await?;
        debug!(submission_id = %id, "Submission enqueued");
        Ok(id)
    }

    /// Loads a submission and its pinned flow version from the store and grades it.
    #[instrument(skip(self), level = "debug")]
    pub async fn dispatch(&self, id: SubmissionId) -> Result<Verdict, CoordinatorError> {
        let submission = self
            .persist("get_submission", self.store.get_submission(id))
            .await?;
        if let Some(verdict) = submission.verdict() {
            debug!(submission_id = %id, "Submission already graded");
            return Ok(verdict);
        }
        let flow = self
            .persist(
                "flow_definition_at",
                self.store
                    .flow_definition_at(&submission.challenge_id, submission.flow_version),
            )
            .await?;
        self.submit(&submission, &flow).await
    }

    /// Grades a submission against a flow definition and persists the verdict.
    ///
    /// Concurrent calls for the same submission share a single evaluation, which
    /// runs on its own task and finishes even if every caller stops waiting.
    /// Calls for a submission that is already terminal return the stored verdict.
    #[instrument(
        skip(self, submission, flow),
        fields(submission_id = %submission.id, flow_version = flow.version()),
        level = "debug"
    )]
    pub async fn submit(
        &self,
        submission: &Submission,
        flow: &FlowDefinition,
    ) -> Result<Verdict, CoordinatorError> {
        if flow.version() != 0 && flow.version() != submission.flow_version {
            return Err(CoordinatorError::FlowVersionMismatch {
                submission_id: submission.id,
                expected: submission.flow_version,
                found: flow.version(),
            });
        }
        if let Some(verdict) = submission.verdict() {
            debug!("Submission already graded");
            return Ok(verdict);
        }

        let receiver = match self.claims.claim(submission.id)? {
            Ticket::Owner(guard) => {
                let receiver = guard.subscribe();
                let coordinator = self.clone();
                let submission = submission.clone();
                let flow = flow.clone();
                // Runs to completion even if every caller's future is dropped.
                tokio::spawn(
                    async move {
                        let outcome = coordinator.settle(&submission, &flow).await;
                        guard.publish(outcome);
                    }
                    .instrument(Span::current()),
                );
                receiver
            }
            Ticket::Joined(receiver) => {
                debug!("Joining running evaluation");
                receiver
            }
        };
        claim::wait_for_outcome(submission.id, receiver).await
    }

    /// Grades a submission on a background task.
    pub fn submit_deferred(
        &self,
        submission: Submission,
        flow: FlowDefinition,
    ) -> JoinHandle<Result<Verdict, CoordinatorError>> {
        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.submit(&submission, &flow).await })
    }

    /// Withdraws a submission that has not been claimed yet.
    #[instrument(skip(self), level = "debug")]
    pub async fn withdraw(&self, id: SubmissionId) -> Result<(), CoordinatorError> {
        self.claims.reserve_withdrawal(id)?;
        match self
            .persist("delete_pending", self.store.delete_pending(id))
            .await
        {
            Ok(()) => {
                info!(submission_id = %id, "Submission withdrawn");
                Ok(())
            }
            Err(e) => {
                self.claims.cancel_withdrawal(id);
                Err(e.into())
            }
        }
    }

    /// Runs under the claim: evaluates, aggregates and writes the verdict once.
    async fn settle(
        &self,
        submission: &Submission,
        flow: &FlowDefinition,
    ) -> Result<Verdict, CoordinatorError> {
        let id = submission.id;

        // The caller's copy may be stale; a previous claim holder may have finished.
        let current = self
            .persist("get_submission", self.store.get_submission(id))
            .await?;
        if let Some(verdict) = current.verdict() {
            debug!("Submission graded by an earlier claim");
            return Ok(verdict);
        }

        let verdict = match self.run_interpreter(submission, flow).await {
            Ok(root) => Aggregator::aggregate(&root, flow.max_score()),
            Err(fault) => {
                error!(submission_id = %id, error = %fault, "Evaluation fault");
                Verdict::internal_failure(self.config.internal_error_message.as_str())
            }
        };

        let scope = submission.submission_type.scoring_scope();
        match self
            .persist("write_verdict", self.store.write_verdict(id, &verdict, scope))
            .await
        {
            Ok(()) => {}
            Err(StoreError::AlreadyTerminal(_)) => {
                warn!(submission_id = %id, "Verdict already written; returning stored verdict");
                let stored = self
                    .persist("get_submission", self.store.get_submission(id))
                    .await?;
                return stored.verdict().ok_or_else(|| {
                    StoreError::Backend(format!("Submission '{}' lost its verdict", id)).into()
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            submission_id = %id,
            status = ?verdict.status,
            score = verdict.score,
            correct_rate = verdict.correct_rate,
            scope = ?scope,
            "Verdict written"
        );
        Ok(verdict)
    }

    /// Evaluates on a separate task so a panicking leaf evaluator surfaces as a fault.
    async fn run_interpreter(
        &self,
        submission: &Submission,
        flow: &FlowDefinition,
    ) -> Result<NodeResult, EvaluationError> {
        let interpreter = self.interpreter.clone();
        let flow = flow.clone();
        let payload = submission.payload.clone();
        tokio::spawn(async move { interpreter.evaluate(&flow, &payload).await })
            .await
            .unwrap_or_else(|join_error| Err(EvaluationError::Aborted(join_error.to_string())))
    }

    /// Bounds a store call by the configured persistence timeout.
    async fn persist<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.config.persistence_timeout(), call)
            .await
            .unwrap_or_else(|_| {
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms: self.config.persistence_timeout_ms,
                })
            })
    }
}
