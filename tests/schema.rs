//! Validation tests for raw flow definitions.
mod common;
use common::*;
use saiten::error::DetailError;
use saiten::prelude::*;
use serde_json::json;

#[cfg(test)]
mod schema_tests {
    use super::*;

    #[test]
    fn test_valid_flow_is_accepted() {
        let definition = validate_flow(&flow(vec![
            string_leaf("42"),
            flow_with("any", vec![string_leaf("a"), string_leaf_at("/steps/0", "b")]),
        ]))
        .expect("valid flow");

        assert_eq!(definition.leaf_count(), 3);
        assert_eq!(definition.combinator(), Combinator::All);
        assert_eq!(definition.children().len(), 2);
        assert_eq!(definition.max_score(), 100.0);
        assert_eq!(definition.version(), 0);
    }

    #[test]
    fn test_non_flow_root_is_rejected_at_root_path() {
        let error = validate_flow(&string_leaf("42")).unwrap_err();
        assert!(matches!(error, SchemaError::RootNotFlow { ref found } if found == "string"));
        assert_eq!(error.path().to_string(), "");
        assert!(error.path().is_root());
        assert_eq!(error.expected_kind(), Some("flow"));
    }

    #[test]
    fn test_missing_expected_points_at_node() {
        let error = validate_flow(&flow(vec![string_leaf("ok"), json!({"kind": "string"})]))
            .unwrap_err();

        assert_eq!(
            error,
            SchemaError::InvalidDetail {
                path: NodePath::from(vec![1]),
                kind: "string".to_string(),
                issue: DetailError::MissingField("expected".to_string()),
            }
        );
        assert_eq!(error.path().to_string(), "1");
        assert_eq!(error.expected_kind(), Some("string"));
    }

    #[test]
    fn test_nested_error_path() {
        let raw = flow(vec![
            string_leaf("x"),
            flow(vec![string_leaf("y"), json!({"kind": "string", "expected": 7})]),
        ]);
        let error = validate_flow(&raw).unwrap_err();
        assert_eq!(error.path().to_string(), "1.1");
        assert!(matches!(
            error,
            SchemaError::InvalidDetail {
                issue: DetailError::WrongType { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_first_mismatch_in_declaration_order_wins() {
        let raw = flow(vec![
            json!({"kind": "mystery"}),
            json!({"kind": "string"}),
        ]);
        let error = validate_flow(&raw).unwrap_err();
        assert_eq!(
            error,
            SchemaError::UnknownKind {
                path: NodePath::from(vec![0]),
                kind: "mystery".to_string(),
            }
        );
    }

    #[test]
    fn test_structural_errors() {
        let cases = vec![
            (json!("flow"), "", "must be a JSON object"),
            (json!({"children": []}), "", "no string 'kind'"),
            (json!({"kind": "flow"}), "", "'children'"),
            (json!({"kind": "flow", "children": {}}), "", "'children'"),
            (flow(vec![json!(3)]), "0", "must be a JSON object"),
            (flow(vec![json!({"kind": 3})]), "0", "no string 'kind'"),
            (flow_with("most", vec![]), "", "unknown combinator 'most'"),
        ];

        for (raw, path, fragment) in cases {
            let error = validate_flow(&raw).unwrap_err();
            assert_eq!(error.path().to_string(), path, "path for {}", raw);
            assert!(
                error.to_string().contains(fragment),
                "'{}' should mention '{}'",
                error,
                fragment
            );
        }
    }

    #[test]
    fn test_empty_flow_is_valid() {
        let definition = validate_flow(&flow(vec![])).unwrap();
        assert_eq!(definition.leaf_count(), 0);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let raw = flow(vec![string_leaf("a"), json!({"kind": "string", "field": ""})]);
        let first = validate_flow(&raw).unwrap_err();
        for _ in 0..10 {
            assert_eq!(validate_flow(&raw).unwrap_err(), first);
        }

        let ok = flow(vec![string_leaf("a"), flow(vec![string_leaf("b")])]);
        let a = validate_flow(&ok).unwrap();
        let b = validate_flow(&ok).unwrap();
        assert_eq!(a.root(), b.root());
        assert_eq!(a.root().to_json(), b.root().to_json());
    }

    #[test]
    fn test_depth_limit() {
        let mut raw = flow(vec![string_leaf("deep")]);
        for _ in 0..4 {
            raw = flow(vec![raw]);
        }

        let registry = KindRegistry::with_builtins();
        let strict = FlowValidator::builder(registry.clone()).with_max_depth(3).build();
        let error = strict.validate(&raw).unwrap_err();
        assert!(matches!(error, SchemaError::TooDeep { max_depth: 3, .. }));
        assert_eq!(error.path().to_string(), "0.0.0.0");

        let relaxed = FlowValidator::builder(registry).with_max_depth(5).build();
        assert!(relaxed.validate(&raw).is_ok());
    }

    #[test]
    fn test_kind_alias_resolves_to_canonical_kind() {
        let registry = KindRegistry::builder()
            .with_kind_alias("text", "string")
            .with_kind_alias("group", "flow")
            .build();
        let validator = FlowValidator::builder(registry).build();

        let raw = json!({
            "kind": "group",
            "children": [{ "kind": "text", "expected": "hi" }]
        });
        let definition = validator.validate(&raw).unwrap();
        match &definition.children()[0] {
            FlowNode::Leaf(leaf) => assert_eq!(leaf.kind, "string"),
            other => panic!("expected a leaf, got {:?}", other),
        }

        // Aliases do not leak into the default registry.
        assert!(matches!(
            validate_flow(&raw),
            Err(SchemaError::RootNotFlow { .. })
        ));
    }

    #[test]
    fn test_external_kind_required_fields() {
        let validator = FlowValidator::builder(test_registry(CountingVerifier::new())).build();

        let error = validator
            .validate(&flow(vec![json!({"kind": "remote"})]))
            .unwrap_err();
        assert_eq!(error.path().to_string(), "0");
        assert_eq!(error.expected_kind(), Some("remote"));

        assert!(
            validator
                .validate(&flow(vec![json!({"kind": "remote", "expected": 1})]))
                .is_ok()
        );
    }

    #[test]
    fn test_validate_str_reports_parse_errors() {
        let validator = FlowValidator::with_defaults();
        let error = validator.validate_str("{ not json").unwrap_err();
        assert!(matches!(error, SchemaError::JsonParse(_)));
        assert!(error.path().is_root());

        let definition = validator
            .validate_str(r#"{"kind":"flow","combinator":"failFast","children":[]}"#)
            .unwrap();
        assert_eq!(definition.combinator(), Combinator::FailFast);
    }

    #[test]
    fn test_config_drives_validator_limits() {
        let config = EngineConfig::default()
            .with_max_depth(1)
            .with_default_max_score(10.0);
        let validator = FlowValidator::from_config(KindRegistry::with_builtins(), &config);

        let definition = validator.validate(&flow(vec![string_leaf("a")])).unwrap();
        assert_eq!(definition.max_score(), 10.0);

        let nested = flow(vec![flow(vec![string_leaf("a")])]);
        assert!(matches!(
            validator.validate(&nested),
            Err(SchemaError::TooDeep { .. })
        ));
    }
}
