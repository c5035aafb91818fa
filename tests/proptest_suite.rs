//! Property-based tests for provenance_errors
//!
//! These tests use proptest to generate random inputs and verify invariants hold.

use provenance_errors::{
    Cause, CreateOptions, DefinitionProblem, ErrorContext, ErrorDefinition, ErrorFactory,
    ExpectedLevel, FactoryConfig, MemorySink, RecordSink, check_chain, create_error_from_value,
    render, render_value, validate, validate_value,
};
use proptest::prelude::*;
use serde_json::{Value, json};

fn factory(strict: bool) -> ErrorFactory {
    ErrorFactory::new(FactoryConfig::new(strict).with_capture_stack(false))
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "\\PC{0,20}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

// ============================================================================
// TEMPLATING PROPERTIES
// ============================================================================

proptest! {
    /// Templates without braces render to themselves
    #[test]
    fn placeholder_free_templates_are_identity(t in "[^{}]{0,200}") {
        prop_assert_eq!(render(&t, &ErrorContext::new()), t);
    }

    /// An empty context never changes a template
    #[test]
    fn empty_context_is_identity(t in "\\PC{0,200}") {
        prop_assert_eq!(render(&t, &ErrorContext::new()), t);
    }

    /// Substituted values are never expanded again
    #[test]
    fn substitution_is_not_recursive(key in "[b-z][a-z]{0,7}", value in "\\{[a-z]{1,8}\\}") {
        let ctx = ErrorContext::new().with(key.clone(), value.clone()).with("a", "X");
        prop_assert_eq!(render(&format!("{{{}}}", key), &ctx), value);
    }

    /// String values are inserted verbatim
    #[test]
    fn strings_are_inserted_verbatim(prefix in "[^{}]{0,20}", value in "\\PC{0,40}") {
        let ctx = ErrorContext::new().with("v", value.clone());
        prop_assert_eq!(render(&format!("{}{{v}}", prefix), &ctx), format!("{}{}", prefix, value));
    }

    /// Non-string templates always render empty
    #[test]
    fn non_string_templates_render_empty(n in any::<i64>(), b in any::<bool>()) {
        prop_assert_eq!(render_value(&json!(n), &json!({})), "");
        prop_assert_eq!(render_value(&json!(b), &Value::Null), "");
    }
}

// ============================================================================
// VALIDATION PROPERTIES
// ============================================================================

proptest! {
    /// Validation is total over arbitrary JSON and reports at most three problems
    #[test]
    fn validate_value_never_panics(value in arb_json()) {
        let problems = validate_value(Some(&value));
        prop_assert!(problems.len() <= 3);
        if !value.is_object() {
            prop_assert_eq!(problems.as_slice(), [DefinitionProblem::InvalidDefinition]);
        }
    }

    /// Well-formed codes and messages produce no problems
    #[test]
    fn valid_definitions_pass(code in "[A-Z][A-Z0-9_]{0,30}", message in "\\PC{1,80}") {
        let def = ErrorDefinition::from_value(&json!({"code": code, "message": message})).unwrap();
        prop_assert!(validate(&def).is_empty());
    }

    /// Codes with a lowercase letter are always flagged
    #[test]
    fn lowercase_codes_are_flagged(code in "[A-Z]{0,5}[a-z][A-Za-z]{0,5}") {
        let problems = validate_value(Some(&json!({"code": code, "message": "m"})));
        let flagged = matches!(problems.as_slice(), [DefinitionProblem::InvalidCodeFormat { .. }]);
        prop_assert!(flagged);
    }
}

// ============================================================================
// FACTORY PROPERTIES
// ============================================================================

proptest! {
    /// The factory returns an error for any definition and context, in either mode
    #[test]
    fn factory_is_total(def in arb_json(), ctx in arb_json(), strict in any::<bool>()) {
        let context = ErrorContext::from_value(ctx).unwrap_or_default();
        let err = factory(strict).create_error_from_value(&def, context, None, CreateOptions::default());
        prop_assert!(err.to_json().is_object());
    }

    /// Strict mode only ever yields a valid definition's code or a fallback code
    #[test]
    fn strict_codes_are_well_formed(def in arb_json()) {
        let err = create_error_from_value(&def, ErrorContext::new(), None);
        prop_assert!(provenance_errors::is_valid_code(err.code()));
    }

    /// The supplied cause survives a successful construction
    #[test]
    fn cause_is_kept(message in "\\PC{0,40}") {
        let err = factory(true).create_error(
            &ErrorDefinition::new("WRAPPED", "wrapped"),
            ErrorContext::new(),
            Some(Cause::foreign(std::io::Error::other(message.clone()))),
        );
        prop_assert_eq!(err.original().unwrap().message(), message);
    }
}

// ============================================================================
// CHAIN PROPERTIES
// ============================================================================

proptest! {
    /// A chain of n levels matches exactly n expected levels
    #[test]
    fn chain_length_is_exact(depth in 1usize..8) {
        let def = ErrorDefinition::new("LEVEL", "level");
        let mut err = factory(true).create_error(&def, ErrorContext::new(), None);
        for _ in 1..depth {
            err = factory(true).create_error(&def, ErrorContext::new(), Some(err.into()));
        }

        prop_assert_eq!(err.depth(), depth);
        let exact = vec![ExpectedLevel::code("LEVEL"); depth];
        prop_assert!(check_chain(&err, &exact).is_ok());

        let longer = vec![ExpectedLevel::any(); depth + 1];
        prop_assert!(check_chain(&err, &longer).is_err());

        let shorter = vec![ExpectedLevel::any(); depth - 1];
        prop_assert!(check_chain(&err, &shorter).is_err());
    }
}

// ============================================================================
// MEMORY SINK PROPERTIES
// ============================================================================

proptest! {
    /// The sink keeps exactly the newest records, in arrival order
    #[test]
    fn memory_sink_keeps_newest_records(
        capacity in 1usize..16,
        messages in prop::collection::vec("\\PC{0,300}", 0..48),
    ) {
        let sink = MemorySink::new(capacity);
        for message in &messages {
            let err = factory(true).create_error(
                &ErrorDefinition::new("NOISY", "{m}"),
                ErrorContext::new().with("m", message.as_str()),
                None,
            );
            sink.record(&err);
        }

        let kept = messages.len().min(capacity);
        prop_assert_eq!(sink.len(), kept);
        prop_assert_eq!(sink.dropped(), (messages.len() - kept) as u64);

        let expected: Vec<&str> = messages[messages.len() - kept..].iter().map(String::as_str).collect();
        let actual: Vec<String> = sink
            .records()
            .iter()
            .map(|record| record["message"].as_str().unwrap_or_default().to_owned())
            .collect();
        prop_assert_eq!(actual, expected);
    }
}
