use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The learner-supplied content a flow is evaluated against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Looks up a designated field.
    ///
    /// A selector starting with `/` is treated as a JSON pointer (`/steps/0/output`);
    /// anything else names a top-level key.
    pub fn field(&self, selector: &str) -> Option<&Value> {
        if selector.starts_with('/') {
            self.0.pointer(selector)
        } else {
            self.0.get(selector)
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
