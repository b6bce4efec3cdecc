use crate::error::ConfigError;
use crate::flow::DEFAULT_MAX_SCORE;
use crate::schema::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// The message persisted for a submission whose evaluation hit an internal fault.
pub const DEFAULT_INTERNAL_ERROR_MESSAGE: &str = "internal error while grading submission";

/// Engine-wide settings, matching the expected JSON format of a config file.
///
/// Every field is optional in the file; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Deadline for each delegated verifier call.
    pub verifier_timeout_ms: u64,
    /// Deadline for each call into the submission store.
    pub persistence_timeout_ms: u64,
    /// Deepest node nesting the validator accepts.
    pub max_depth: usize,
    /// Max score given to definitions that do not set their own.
    pub default_max_score: f64,
    /// Sanitized message persisted when evaluation fails internally.
    pub internal_error_message: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verifier_timeout_ms: 5_000,
            persistence_timeout_ms: 2_000,
            max_depth: DEFAULT_MAX_DEPTH,
            default_max_score: DEFAULT_MAX_SCORE,
            internal_error_message: DEFAULT_INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load the config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }

    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    pub fn with_verifier_timeout(mut self, timeout: Duration) -> Self {
        self.verifier_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_persistence_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_default_max_score(mut self, max_score: f64) -> Self {
        self.default_max_score = max_score;
        self
    }

    pub fn with_internal_error_message(mut self, message: impl Into<String>) -> Self {
        self.internal_error_message = message.into();
        self
    }
}
