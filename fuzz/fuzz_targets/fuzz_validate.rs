#![no_main]

use libfuzzer_sys::fuzz_target;
use provenance_errors::{DefinitionProblem, ErrorDefinition, validate, validate_value};
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };

    let problems = validate_value(Some(&value));
    assert!(problems.len() <= 3);
    if !value.is_object() {
        assert_eq!(problems.as_slice(), [DefinitionProblem::InvalidDefinition]);
    }

    // Typed and untyped validators agree on convertible definitions
    if let Ok(typed) = ErrorDefinition::from_value(&value)
        && value.get("code").is_some_and(Value::is_string)
        && value.get("message").is_some_and(Value::is_string)
    {
        assert_eq!(validate(&typed).len(), problems.len());
    }
});
