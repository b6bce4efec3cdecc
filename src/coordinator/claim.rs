use crate::error::CoordinatorError;
use crate::submission::SubmissionId;
use crate::verdict::Verdict;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::watch;

/// What the single evaluation of a claimed submission ends with.
pub(super) type Outcome = Result<Verdict, CoordinatorError>;

/// Receiving side of a claim; resolves once the claim holder publishes its outcome.
pub(super) type OutcomeReceiver = watch::Receiver<Option<Outcome>>;

enum Claim {
    Running(OutcomeReceiver),
    Withdrawn,
}

/// Result of [`ClaimTable::claim`].
pub(super) enum Ticket {
    /// The caller now holds the claim and must evaluate, publish and release.
    Owner(ClaimGuard),
    /// An evaluation is already running; wait for its outcome.
    Joined(OutcomeReceiver),
}

/// Submission-id-keyed exclusivity guard.
///
/// An entry exists only while a submission is being evaluated, or permanently
/// once it has been withdrawn. Map entries are locked per shard and never held
/// across an await point.
#[derive(Default)]
pub(super) struct ClaimTable {
    claims: DashMap<SubmissionId, Claim>,
}

impl ClaimTable {
    /// Claims a submission, or joins the evaluation already running for it.
    pub(super) fn claim(self: &Arc<Self>, id: SubmissionId) -> Result<Ticket, CoordinatorError> {
        match self.claims.entry(id) {
            Entry::Occupied(entry) => match entry.get() {
                Claim::Running(receiver) => Ok(Ticket::Joined(receiver.clone())),
                Claim::Withdrawn => Err(CoordinatorError::Withdrawn(id)),
            },
            Entry::Vacant(entry) => {
                let (sender, receiver) = watch::channel(None);
                entry.insert(Claim::Running(receiver));
                Ok(Ticket::Owner(ClaimGuard {
                    table: Arc::clone(self),
                    id,
                    sender,
                }))
            }
        }
    }

    fn release(&self, id: SubmissionId) {
        self.claims
            .remove_if(&id, |_, claim| matches!(claim, Claim::Running(_)));
    }

    /// Marks a submission as withdrawn so it can never be claimed.
    pub(super) fn reserve_withdrawal(&self, id: SubmissionId) -> Result<(), CoordinatorError> {
        match self.claims.entry(id) {
            Entry::Occupied(entry) => match entry.get() {
                Claim::Running(_) => Err(CoordinatorError::AlreadyClaimed(id)),
                Claim::Withdrawn => Ok(()),
            },
            Entry::Vacant(entry) => {
                entry.insert(Claim::Withdrawn);
                Ok(())
            }
        }
    }

    /// Undoes [`reserve_withdrawal`](Self::reserve_withdrawal) when the store refused it.
    pub(super) fn cancel_withdrawal(&self, id: SubmissionId) {
        self.claims
            .remove_if(&id, |_, claim| matches!(claim, Claim::Withdrawn));
    }

    /// Number of submissions currently being evaluated.
    pub(super) fn in_flight(&self) -> usize {
        self.claims
            .iter()
            .filter(|entry| matches!(entry.value(), Claim::Running(_)))
            .count()
    }
}

/// Held by the one task evaluating a claimed submission.
///
/// The claim is released when the guard drops, after the outcome (if any) has
/// been published, so a later claim never overlaps this one.
pub(super) struct ClaimGuard {
    table: Arc<ClaimTable>,
    id: SubmissionId,
    sender: watch::Sender<Option<Outcome>>,
}

impl ClaimGuard {
    pub(super) fn subscribe(&self) -> OutcomeReceiver {
        self.sender.subscribe()
    }

    /// Hands the outcome to every waiting caller and releases the claim.
    pub(super) fn publish(self, outcome: Outcome) {
        self.sender.send_replace(Some(outcome));
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.table.release(self.id);
    }
}

/// Waits for the claim holder's outcome.
pub(super) async fn wait_for_outcome(id: SubmissionId, mut receiver: OutcomeReceiver) -> Outcome {
    match receiver.wait_for(Option::is_some).await {
        Ok(published) => published
            .as_ref()
            .cloned()
            .unwrap_or(Err(CoordinatorError::Abandoned(id))),
        Err(_) => Err(CoordinatorError::Abandoned(id)),
    }
}
