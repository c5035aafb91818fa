//! Shape checks for error definitions.
//!
//! Validation never fails and never panics: it returns the list of problems
//! found, empty when the definition is usable. All applicable problems are
//! reported, not just the first.
//!
//! ```rust
//! use provenance_errors::{validate, DefinitionProblem, ErrorDefinition};
//!
//! let problems = validate(&ErrorDefinition::new("invalid-code", "m"));
//! assert_eq!(problems.len(), 1);
//! assert!(matches!(problems[0], DefinitionProblem::InvalidCodeFormat { .. }));
//!
//! assert!(validate(&ErrorDefinition::new("VALID_CODE", "m")).is_empty());
//! ```
//!
//! [`validate_value`] applies the same checks to untyped JSON, where the
//! definition itself may be missing or of the wrong kind.

use crate::ErrorDefinition;
use crate::codes::{CODE_PATTERN, is_valid_code};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Problems found in one definition. At most three can apply at once.
pub type Problems = SmallVec<[DefinitionProblem; 3]>;

/// One defect in an error definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionProblem {
    /// The definition is absent, not an object, or an array.
    InvalidDefinition,
    /// `code` is absent, empty or not a string.
    MissingCode,
    /// `code` is present but does not match the code grammar.
    InvalidCodeFormat {
        /// The offending code.
        code: String,
    },
    /// `message` is absent, empty or not a string.
    MissingMessage,
}

impl fmt::Display for DefinitionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDefinition => {
                write!(f, "Error definition is missing or is not an object")
            }
            Self::MissingCode => {
                write!(f, "Missing or invalid 'code' (must be a non-empty string)")
            }
            Self::InvalidCodeFormat { code } => {
                write!(f, "Invalid code format '{}' (must match {})", code, CODE_PATTERN)
            }
            Self::MissingMessage => {
                write!(f, "Missing or invalid 'message' (must be a non-empty string)")
            }
        }
    }
}

/// Validate a typed definition.
pub fn validate(definition: &ErrorDefinition) -> Problems {
    check_fields(Some(definition.code.as_ref()), Some(definition.message.as_ref()))
}

/// Validate an untyped definition.
///
/// `None`, `null`, scalars and arrays yield exactly one
/// [`DefinitionProblem::InvalidDefinition`]. Objects are checked field by
/// field; a `code` or `message` of the wrong type counts as missing.
pub fn validate_value(definition: Option<&Value>) -> Problems {
    let Some(Value::Object(map)) = definition else {
        let mut problems = Problems::new();
        problems.push(DefinitionProblem::InvalidDefinition);
        return problems;
    };
    check_fields(
        map.get("code").and_then(Value::as_str),
        map.get("message").and_then(Value::as_str),
    )
}

fn check_fields(code: Option<&str>, message: Option<&str>) -> Problems {
    let mut problems = Problems::new();

    match code {
        Some(code) if !code.is_empty() => {
            if !is_valid_code(code) {
                problems.push(DefinitionProblem::InvalidCodeFormat {
                    code: code.to_owned(),
                });
            }
        }
        _ => problems.push(DefinitionProblem::MissingCode),
    }

    if message.is_none_or(str::is_empty) {
        problems.push(DefinitionProblem::MissingMessage);
    }

    problems
}

/// Join problems the way fallback contexts present them.
pub fn problems_text(problems: &[DefinitionProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_reports_code_and_message() {
        let problems = validate_value(Some(&json!({})));
        assert_eq!(
            problems.as_slice(),
            [DefinitionProblem::MissingCode, DefinitionProblem::MissingMessage]
        );
    }

    #[test]
    fn non_records_report_single_problem() {
        for value in [Value::Null, json!(42), json!([]), json!("CODE")] {
            let problems = validate_value(Some(&value));
            assert_eq!(problems.as_slice(), [DefinitionProblem::InvalidDefinition], "{value}");
        }
        assert_eq!(validate_value(None).as_slice(), [DefinitionProblem::InvalidDefinition]);
    }

    #[test]
    fn code_format_is_checked() {
        let problems = validate_value(Some(&json!({"code": "invalid-code", "message": "m"})));
        assert_eq!(
            problems.as_slice(),
            [DefinitionProblem::InvalidCodeFormat { code: "invalid-code".into() }]
        );
        assert!(validate_value(Some(&json!({"code": "VALID_CODE", "message": "m"}))).is_empty());
    }

    #[test]
    fn wrong_types_count_as_missing() {
        let problems = validate_value(Some(&json!({"code": 7, "message": false})));
        assert_eq!(
            problems.as_slice(),
            [DefinitionProblem::MissingCode, DefinitionProblem::MissingMessage]
        );
    }

    #[test]
    fn typed_definition_reports_all_problems() {
        let def = ErrorDefinition::new("bad code", "");
        let problems = validate(&def);
        assert_eq!(problems.len(), 2);
        assert!(matches!(problems[0], DefinitionProblem::InvalidCodeFormat { .. }));
        assert_eq!(problems[1], DefinitionProblem::MissingMessage);
    }

    #[test]
    fn missing_code_only() {
        let def = ErrorDefinition {
            message: "Only message".into(),
            ..ErrorDefinition::default()
        };
        assert_eq!(validate(&def).as_slice(), [DefinitionProblem::MissingCode]);
    }

    #[test]
    fn problems_join_with_semicolons() {
        let text = problems_text(&[DefinitionProblem::MissingCode, DefinitionProblem::MissingMessage]);
        assert_eq!(text.matches("; ").count(), 1);
        assert!(text.starts_with("Missing or invalid 'code'"));
    }
}
