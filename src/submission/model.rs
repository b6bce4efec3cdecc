use crate::error::StoreError;
use crate::flow::Payload;
use crate::verdict::{Verdict, VerdictStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a submission counts towards official scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionType {
    /// An official attempt.
    Execute,
    /// A trial run; graded the same way but never authoritative.
    PreExecute,
}

impl SubmissionType {
    pub fn scoring_scope(&self) -> ScoringScope {
        match self {
            SubmissionType::Execute => ScoringScope::Official,
            SubmissionType::PreExecute => ScoringScope::Trial,
        }
    }
}

/// Tells the persistence layer whether a verdict may affect scoring and leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoringScope {
    Official,
    Trial,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Failed,
    Passed,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

impl From<VerdictStatus> for SubmissionStatus {
    fn from(status: VerdictStatus) -> Self {
        match status {
            VerdictStatus::Failed => SubmissionStatus::Failed,
            VerdictStatus::Passed => SubmissionStatus::Passed,
        }
    }
}

/// The envelope supplied by the API layer for a new attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub challenge_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    pub payload: Payload,
}

/// A persisted submission record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub challenge_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub submission_type: SubmissionType,
    pub status: SubmissionStatus,
    /// `-1` until graded.
    pub score: f64,
    /// `-1` until graded.
    pub correct_rate: f64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub payload: Payload,
    /// The flow definition version this submission is graded against.
    pub flow_version: u64,
}

impl Submission {
    /// A fresh, ungraded record.
    pub fn pending(id: SubmissionId, new: NewSubmission, flow_version: u64) -> Self {
        Self {
            id,
            challenge_id: new.challenge_id,
            user_id: new.user_id,
            submission_type: new.submission_type,
            status: SubmissionStatus::Pending,
            score: -1.0,
            correct_rate: -1.0,
            message: String::new(),
            created_at: Utc::now(),
            payload: new.payload,
            flow_version,
        }
    }

    /// The stored verdict, once the submission is terminal.
    pub fn verdict(&self) -> Option<Verdict> {
        let status = match self.status {
            SubmissionStatus::Pending => return None,
            SubmissionStatus::Failed => VerdictStatus::Failed,
            SubmissionStatus::Passed => VerdictStatus::Passed,
        };
        Some(Verdict {
            status,
            score: self.score,
            correct_rate: self.correct_rate,
            message: self.message.clone(),
        })
    }

    /// Moves the submission to its terminal state. Fails if it already has one.
    pub fn apply_verdict(&mut self, verdict: &Verdict) -> Result<(), StoreError> {
        if self.status.is_terminal() {
            return Err(StoreError::AlreadyTerminal(self.id));
        }
        self.status = verdict.status.into();
        self.score = verdict.score;
        self.correct_rate = verdict.correct_rate;
        self.message = verdict.message.clone();
        Ok(())
    }
}
