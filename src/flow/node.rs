use serde_json::{Map, Value};
use std::fmt;

/// The kind name reserved for composite nodes.
pub const FLOW_KIND: &str = "flow";

/// Combines the results of a composite node's children into the node's own outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Every child is evaluated; the node passes iff all children pass.
    #[default]
    All,
    /// Every child is evaluated; the node passes iff at least one child passes.
    Any,
    /// Children are evaluated in order until the first failure; the rest are skipped.
    FailFast,
}

impl Combinator {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Combinator::All),
            "any" => Some(Combinator::Any),
            "failFast" => Some(Combinator::FailFast),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Combinator::All => "all",
            Combinator::Any => "any",
            Combinator::FailFast => "failFast",
        }
    }

    /// Whether a failing child stops evaluation of its remaining siblings.
    pub fn short_circuits(&self) -> bool {
        matches!(self, Combinator::FailFast)
    }

    /// Computes a composite node's outcome from its children's outcomes.
    pub fn combine(&self, outcomes: impl IntoIterator<Item = bool>) -> bool {
        let mut outcomes = outcomes.into_iter().peekable();
        match self {
            Combinator::All | Combinator::FailFast => outcomes.all(|passed| passed),
            // An empty `any` node passes, the same as an empty flow.
            Combinator::Any => outcomes.peek().is_none() || outcomes.any(|passed| passed),
        }
    }
}

/// A single checkable criterion with its kind-specific detail fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    /// The canonical (alias-resolved) kind name.
    pub kind: String,
    pub detail: Map<String, Value>,
}

/// A validated node of a flow definition.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowNode {
    Flow {
        combinator: Combinator,
        children: Vec<FlowNode>,
    },
    Leaf(LeafNode),
}

impl FlowNode {
    pub fn kind(&self) -> &str {
        match self {
            FlowNode::Flow { .. } => FLOW_KIND,
            FlowNode::Leaf(leaf) => &leaf.kind,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FlowNode::Leaf(_))
    }

    /// Counts the leaf nodes reachable from this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            FlowNode::Leaf(_) => 1,
            FlowNode::Flow { children, .. } => children.iter().map(FlowNode::leaf_count).sum(),
        }
    }

    /// Converts the node back into its raw JSON shape.
    pub fn to_json(&self) -> Value {
        match self {
            FlowNode::Flow {
                combinator,
                children,
            } => {
                let mut object = Map::new();
                object.insert("kind".to_string(), Value::from(FLOW_KIND));
                if *combinator != Combinator::All {
                    object.insert("combinator".to_string(), Value::from(combinator.name()));
                }
                object.insert(
                    "children".to_string(),
                    Value::Array(children.iter().map(FlowNode::to_json).collect()),
                );
                Value::Object(object)
            }
            FlowNode::Leaf(leaf) => {
                let mut object = leaf.detail.clone();
                object.insert("kind".to_string(), Value::from(leaf.kind.as_str()));
                Value::Object(object)
            }
        }
    }

    /// Recursively formats the node as a tree.
    fn fmt_as_tree(&self, f: &mut fmt::Formatter<'_>, prefix: &str, is_last: bool) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match self {
            FlowNode::Flow {
                combinator,
                children,
            } => {
                writeln!(f, "flow ({})", combinator.name())?;
                for (index, child) in children.iter().enumerate() {
                    child.fmt_as_tree(f, &child_prefix, index + 1 == children.len())?;
                }
            }
            FlowNode::Leaf(leaf) => writeln!(f, "{}", leaf.kind)?,
        }
        Ok(())
    }
}

impl fmt::Display for FlowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(f, "", true)
    }
}
