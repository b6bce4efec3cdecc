use super::{LeafContext, LeafKind, LeafOutcome, optional_str, require_str};
use crate::error::{DetailError, EvaluationError};
use crate::flow::Payload;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// The payload field a `string` node reads when it does not name one.
pub const DEFAULT_ANSWER_FIELD: &str = "answer";

/// Built-in `string` kind: exact, case-sensitive comparison of one payload field.
///
/// Detail fields: `expected` (required string) and `field` (optional string,
/// defaulting to [`DEFAULT_ANSWER_FIELD`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKind;

impl StringKind {
    pub const NAME: &'static str = "string";
}

#[async_trait]
impl LeafKind for StringKind {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn check_schema(&self, detail: &Map<String, Value>) -> Result<(), DetailError> {
        require_str(detail, "expected")?;
        if let Some(field) = optional_str(detail, "field")? {
            if field.is_empty() {
                return Err(DetailError::Invalid(
                    "field 'field' must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        detail: &Map<String, Value>,
        payload: &Payload,
        ctx: LeafContext<'_>,
    ) -> Result<LeafOutcome, EvaluationError> {
        let to_leaf_error = |issue: DetailError| EvaluationError::Leaf {
            path: ctx.path.clone(),
            message: issue.to_string(),
        };
        let expected = require_str(detail, "expected").map_err(&to_leaf_error)?;
        let field = optional_str(detail, "field")
            .map_err(&to_leaf_error)?
            .unwrap_or(DEFAULT_ANSWER_FIELD);

        let outcome = match payload.field(field) {
            Some(Value::String(actual)) if actual == expected => LeafOutcome::pass(),
            Some(Value::String(_)) => LeafOutcome::fail(format!("field '{}' did not match", field)),
            Some(_) => LeafOutcome::fail(format!("field '{}' is not a string", field)),
            None => LeafOutcome::fail(format!("field '{}' is missing", field)),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::NodePath;
    use serde_json::json;
    use std::time::Duration;

    fn detail(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn evaluate(detail: &Map<String, Value>, payload: Value) -> LeafOutcome {
        let path = NodePath::root();
        let ctx = LeafContext {
            path: &path,
            verifier_timeout: Duration::from_secs(1),
        };
        tokio_test::block_on(StringKind.evaluate(detail, &Payload::new(payload), ctx)).unwrap()
    }

    #[test]
    fn test_schema_requires_expected_string() {
        assert_eq!(
            StringKind.check_schema(&detail(json!({}))),
            Err(DetailError::MissingField("expected".to_string()))
        );
        assert!(matches!(
            StringKind.check_schema(&detail(json!({"expected": 42}))),
            Err(DetailError::WrongType { .. })
        ));
        assert!(StringKind.check_schema(&detail(json!({"expected": "42"}))).is_ok());
    }

    #[test]
    fn test_schema_rejects_empty_field_selector() {
        let result = StringKind.check_schema(&detail(json!({"expected": "a", "field": ""})));
        assert!(matches!(result, Err(DetailError::Invalid(_))));
    }

    #[test]
    fn test_match_is_exact_and_case_sensitive() {
        let d = detail(json!({"expected": "Hello"}));
        assert!(evaluate(&d, json!({"answer": "Hello"})).passed);
        assert!(!evaluate(&d, json!({"answer": "hello"})).passed);
        assert!(!evaluate(&d, json!({"answer": "Hello "})).passed);
    }

    #[test]
    fn test_non_string_field_fails() {
        let d = detail(json!({"expected": "42"}));
        let outcome = evaluate(&d, json!({"answer": 42}));
        assert!(!outcome.passed);
        assert_eq!(outcome.message.as_deref(), Some("field 'answer' is not a string"));
    }

    #[test]
    fn test_failure_message_does_not_reveal_expected_value() {
        let d = detail(json!({"expected": "secret-token"}));
        let outcome = evaluate(&d, json!({"answer": "guess"}));
        assert!(!outcome.message.unwrap().contains("secret-token"));
    }
}
