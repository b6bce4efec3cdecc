use crate::error::SchemaError;
use crate::flow::{Combinator, FLOW_KIND, FlowNode, LeafNode, NodePath};
use crate::kind::KindRegistry;
use serde_json::{Map, Value};

/// Responsible for turning a raw JSON node tree into validated `FlowNode`s.
pub(super) struct NodeBuilder<'a> {
    registry: &'a KindRegistry,
    max_depth: usize,
}

impl<'a> NodeBuilder<'a> {
    pub(super) fn new(registry: &'a KindRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    pub(super) fn build_root(&self, raw: &Value) -> Result<FlowNode, SchemaError> {
        self.build_node(raw, &NodePath::root())
    }

    /// Recursively validates one node and its descendants, in declaration order.
    fn build_node(&self, raw: &Value, path: &NodePath) -> Result<FlowNode, SchemaError> {
        if path.depth() > self.max_depth {
            return Err(SchemaError::TooDeep {
                path: path.clone(),
                max_depth: self.max_depth,
            });
        }

        let object = raw.as_object().ok_or_else(|| SchemaError::NotAnObject {
            path: path.clone(),
        })?;
        let kind = object
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::MissingKind { path: path.clone() })?;
        let canonical =
            self.registry
                .canonical_name(kind)
                .ok_or_else(|| SchemaError::UnknownKind {
                    path: path.clone(),
                    kind: kind.to_string(),
                })?;

        if canonical == FLOW_KIND {
            self.build_composite(object, path)
        } else {
            self.build_leaf(object, canonical, path)
        }
    }

    fn build_composite(
        &self,
        object: &Map<String, Value>,
        path: &NodePath,
    ) -> Result<FlowNode, SchemaError> {
        let combinator = match object.get("combinator") {
            None => Combinator::default(),
            Some(Value::String(name)) => {
                Combinator::from_name(name).ok_or_else(|| SchemaError::UnknownCombinator {
                    path: path.clone(),
                    found: name.clone(),
                })?
            }
            Some(other) => {
                return Err(SchemaError::UnknownCombinator {
                    path: path.clone(),
                    found: other.to_string(),
                });
            }
        };

        let raw_children = object
            .get("children")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::MissingChildren { path: path.clone() })?;

        let children = raw_children
            .iter()
            .enumerate()
            .map(|(index, child)| self.build_node(child, &path.child(index)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FlowNode::Flow {
            combinator,
            children,
        })
    }

    fn build_leaf(
        &self,
        object: &Map<String, Value>,
        canonical: &str,
        path: &NodePath,
    ) -> Result<FlowNode, SchemaError> {
        let kind = self
            .registry
            .get(canonical)
            .ok_or_else(|| SchemaError::UnknownKind {
                path: path.clone(),
                kind: canonical.to_string(),
            })?;

        let mut detail = object.clone();
        detail.remove("kind");
        kind.check_schema(&detail)
            .map_err(|issue| SchemaError::InvalidDetail {
                path: path.clone(),
                kind: canonical.to_string(),
                issue,
            })?;

        Ok(FlowNode::Leaf(LeafNode {
            kind: canonical.to_string(),
            detail,
        }))
    }
}
