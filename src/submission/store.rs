//! Persistence interface for submissions and published flow definitions.
//!
//! The coordinator only talks to storage through [`SubmissionStore`]; the
//! in-memory implementation here backs tests and the CLI.

use super::model::{NewSubmission, ScoringScope, Submission, SubmissionId, SubmissionStatus};
use crate::error::StoreError;
use crate::flow::FlowDefinition;
use crate::verdict::Verdict;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persists a pending submission pinned to the challenge's latest flow version.
    async fn create_submission(&self, new: NewSubmission) -> Result<SubmissionId, StoreError>;

    async fn get_submission(&self, id: SubmissionId) -> Result<Submission, StoreError>;

    /// Removes a submission that is still pending.
    async fn delete_pending(&self, id: SubmissionId) -> Result<(), StoreError>;

    /// Stores a new version of a challenge's definition and returns it stamped
    /// with its version. Earlier versions stay readable.
    async fn publish_flow(
        &self,
        challenge_id: &str,
        flow: FlowDefinition,
    ) -> Result<FlowDefinition, StoreError>;

    /// The latest published definition of a challenge.
    async fn get_flow_definition(&self, challenge_id: &str) -> Result<FlowDefinition, StoreError>;

    async fn flow_definition_at(
        &self,
        challenge_id: &str,
        version: u64,
    ) -> Result<FlowDefinition, StoreError>;

    /// Records the terminal verdict. Must fail with [`StoreError::AlreadyTerminal`]
    /// if the submission already has one.
    async fn write_verdict(
        &self,
        id: SubmissionId,
        verdict: &Verdict,
        scope: ScoringScope,
    ) -> Result<(), StoreError>;
}

/// In-memory store for submissions and flow versions.
///
/// Thread-safe via DashMap; clones share the same underlying data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    submissions: Arc<DashMap<SubmissionId, Submission>>,
    /// Published versions per challenge; version `n` lives at index `n - 1`.
    flows: Arc<DashMap<String, Vec<FlowDefinition>>>,
    scopes: Arc<DashMap<SubmissionId, ScoringScope>>,
    verdict_writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope a submission's verdict was written with, if it has one.
    pub fn scoring_scope(&self, id: SubmissionId) -> Option<ScoringScope> {
        self.scopes.get(&id).map(|scope| *scope)
    }

    /// Terminal submissions of a challenge that count towards official scoring.
    pub fn official_results(&self, challenge_id: &str) -> Vec<Submission> {
        let mut results: Vec<Submission> = self
            .submissions
            .iter()
            .filter(|entry| {
                entry.challenge_id == challenge_id
                    && entry.status.is_terminal()
                    && self.scoring_scope(entry.id) == Some(ScoringScope::Official)
            })
            .map(|entry| entry.value().clone())
            .collect();
        results.sort_by_key(|submission| submission.created_at);
        results
    }

    /// Number of verdicts successfully written so far.
    pub fn verdict_writes(&self) -> usize {
        self.verdict_writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn create_submission(&self, new: NewSubmission) -> Result<SubmissionId, StoreError> {
        let version = self
            .flows
            .get(&new.challenge_id)
            .map(|versions| versions.len() as u64)
            .filter(|count| *count > 0)
            .ok_or_else(|| StoreError::FlowNotFound {
                challenge_id: new.challenge_id.clone(),
            })?;

        let id = SubmissionId::new();
        self.submissions
            .insert(id, Submission::pending(id, new, version));
        Ok(id)
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Submission, StoreError> {
        self.submissions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::SubmissionNotFound(id))
    }

    async fn delete_pending(&self, id: SubmissionId) -> Result<(), StoreError> {
        match self.submissions.entry(id) {
            Entry::Occupied(entry) if entry.get().status == SubmissionStatus::Pending => {
                entry.remove();
                Ok(())
            }
            Entry::Occupied(_) => Err(StoreError::NotPending(id)),
            Entry::Vacant(_) => Err(StoreError::SubmissionNotFound(id)),
        }
    }

    async fn publish_flow(
        &self,
        challenge_id: &str,
        flow: FlowDefinition,
    ) -> Result<FlowDefinition, StoreError> {
        let mut versions = self.flows.entry(challenge_id.to_string()).or_default();
        let published = flow.with_version(versions.len() as u64 + 1);
        versions.push(published.clone());
        Ok(published)
    }

    async fn get_flow_definition(&self, challenge_id: &str) -> Result<FlowDefinition, StoreError> {
        self.flows
            .get(challenge_id)
            .and_then(|versions| versions.last().cloned())
            .ok_or_else(|| StoreError::FlowNotFound {
                challenge_id: challenge_id.to_string(),
            })
    }

    async fn flow_definition_at(
        &self,
        challenge_id: &str,
        version: u64,
    ) -> Result<FlowDefinition, StoreError> {
        let index = usize::try_from(version).ok().and_then(|v| v.checked_sub(1));
        self.flows
            .get(challenge_id)
            .and_then(|versions| index.and_then(|i| versions.get(i).cloned()))
            .ok_or_else(|| StoreError::FlowVersionNotFound {
                challenge_id: challenge_id.to_string(),
                version,
            })
    }

    async fn write_verdict(
        &self,
        id: SubmissionId,
        verdict: &Verdict,
        scope: ScoringScope,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .submissions
            .get_mut(&id)
            .ok_or(StoreError::SubmissionNotFound(id))?;
        entry.apply_verdict(verdict)?;
        drop(entry);

        self.scopes.insert(id, scope);
        self.verdict_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Payload;
    use crate::schema::FlowValidator;
    use crate::submission::SubmissionType;
    use serde_json::json;

    fn flow() -> FlowDefinition {
        FlowValidator::with_defaults()
            .validate(&json!({"kind": "flow", "children": []}))
            .unwrap()
    }

    fn new_submission() -> NewSubmission {
        NewSubmission {
            challenge_id: "c1".to_string(),
            user_id: "u1".to_string(),
            submission_type: SubmissionType::Execute,
            payload: Payload::default(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_published_flow() {
        let store = InMemoryStore::new();
        let result = store.create_submission(new_submission()).await;
        assert!(matches!(result, Err(StoreError::FlowNotFound { .. })));
    }

    #[tokio::test]
    async fn test_versions_are_sequential_and_retained() {
        let store = InMemoryStore::new();
        let v1 = store.publish_flow("c1", flow()).await.unwrap();
        let v2 = store.publish_flow("c1", flow()).await.unwrap();
        assert_eq!((v1.version(), v2.version()), (1, 2));
        assert_eq!(store.get_flow_definition("c1").await.unwrap().version(), 2);
        assert_eq!(store.flow_definition_at("c1", 1).await.unwrap().version(), 1);
        assert!(matches!(
            store.flow_definition_at("c1", 0).await,
            Err(StoreError::FlowVersionNotFound { version: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_only_pending() {
        let store = InMemoryStore::new();
        store.publish_flow("c1", flow()).await.unwrap();
        let id = store.create_submission(new_submission()).await.unwrap();
        store
            .write_verdict(id, &Verdict::internal_failure("x"), ScoringScope::Official)
            .await
            .unwrap();
        assert_eq!(store.delete_pending(id).await, Err(StoreError::NotPending(id)));
    }
}
