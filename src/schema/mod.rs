use crate::config::EngineConfig;
use crate::error::SchemaError;
use crate::flow::{DEFAULT_MAX_SCORE, FLOW_KIND, FlowDefinition, FlowNode};
use crate::kind::KindRegistry;
use serde_json::Value;
use std::sync::Arc;

mod builder;

use builder::NodeBuilder;

/// The deepest nesting accepted unless configured otherwise.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Structurally validates raw flow definitions against a [`KindRegistry`].
///
/// Validation is pure: the same input always yields the same result, and
/// nothing about the registry changes after it is built.
#[derive(Clone)]
pub struct FlowValidator {
    registry: Arc<KindRegistry>,
    max_depth: usize,
    default_max_score: f64,
}

pub struct FlowValidatorBuilder {
    registry: Arc<KindRegistry>,
    max_depth: usize,
    default_max_score: f64,
}

impl FlowValidatorBuilder {
    pub fn new(registry: Arc<KindRegistry>) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
            default_max_score: DEFAULT_MAX_SCORE,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_default_max_score(mut self, max_score: f64) -> Self {
        self.default_max_score = max_score;
        self
    }

    pub fn build(self) -> FlowValidator {
        FlowValidator {
            registry: self.registry,
            max_depth: self.max_depth,
            default_max_score: self.default_max_score,
        }
    }
}

impl FlowValidator {
    pub fn builder(registry: Arc<KindRegistry>) -> FlowValidatorBuilder {
        FlowValidatorBuilder::new(registry)
    }

    /// A validator over the built-in kinds with default limits.
    pub fn with_defaults() -> Self {
        Self::builder(KindRegistry::with_builtins()).build()
    }

    pub fn from_config(registry: Arc<KindRegistry>, config: &EngineConfig) -> Self {
        Self::builder(registry)
            .with_max_depth(config.max_depth)
            .with_default_max_score(config.default_max_score)
            .build()
    }

    pub fn registry(&self) -> &Arc<KindRegistry> {
        &self.registry
    }

    /// Validates a raw definition, failing on the first structural mismatch.
    pub fn validate(&self, raw: &Value) -> Result<FlowDefinition, SchemaError> {
        let root_kind = raw
            .as_object()
            .and_then(|object| object.get("kind"))
            .and_then(Value::as_str);
        if let Some(kind) = root_kind {
            if self.registry.canonical_name(kind) != Some(FLOW_KIND) {
                return Err(SchemaError::RootNotFlow {
                    found: kind.to_string(),
                });
            }
        }

        let builder = NodeBuilder::new(&self.registry, self.max_depth);
        let root = builder.build_root(raw)?;
        debug_assert!(matches!(root, FlowNode::Flow { .. }));
        Ok(FlowDefinition::from_validated(root, self.default_max_score))
    }

    /// Parses and validates a JSON document.
    pub fn validate_str(&self, json: &str) -> Result<FlowDefinition, SchemaError> {
        let raw: Value =
            serde_json::from_str(json).map_err(|e| SchemaError::JsonParse(e.to_string()))?;
        self.validate(&raw)
    }
}
