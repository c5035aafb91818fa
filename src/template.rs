//! `{placeholder}` message templating.
//!
//! Templates are plain strings with `{name}` placeholders, where `name` is
//! one or more ASCII word characters (`[A-Za-z0-9_]`). Rendering is a
//! single left-to-right pass:
//!
//! - a placeholder whose key is present with a non-null value is replaced
//!   by the value's display form
//! - a placeholder whose key is absent or `null` is kept verbatim, braces
//!   included, so gaps stay visible in the output
//! - substituted text is never scanned again
//!
//! ```rust
//! use provenance_errors::{render, ErrorContext};
//!
//! let ctx = ErrorContext::new().with("code", "TEST").with("line", 42);
//! assert_eq!(render("Error: {code} at {line}", &ctx), "Error: TEST at 42");
//! assert_eq!(render("Missing value: {key}", &ctx), "Missing value: {key}");
//! ```

use crate::ErrorContext;
use serde_json::Value;
use std::borrow::Cow;

/// Render `template` against `context`.
pub fn render(template: &str, context: &ErrorContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let name_len = after
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();

        if name_len > 0 && after.as_bytes().get(name_len) == Some(&b'}') {
            let name = &after[..name_len];
            match context.get(name).and_then(display_value) {
                Some(text) => out.push_str(&text),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &after[name_len + 1..];
        } else {
            // Not a placeholder; emit the brace and keep scanning after it.
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

/// Render an untyped template.
///
/// Anything other than a JSON string renders to the empty string. A
/// `context` that is not an object is treated as empty.
pub fn render_value(template: &Value, context: &Value) -> String {
    let Value::String(template) = template else {
        return String::new();
    };
    match context {
        Value::Object(map) => render(template, &ErrorContext::from(map.clone())),
        _ => render(template, &ErrorContext::new()),
    }
}

/// Display form of a context value, or `None` for `null`.
///
/// Strings are inserted without quotes; numbers and booleans use their JSON
/// text; arrays and objects are written as compact JSON.
pub fn display_value(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}
