//! Caller-supplied context carried by structured errors.
//!
//! An [`ErrorContext`] is an ordered string-keyed map of JSON values. It
//! serves two purposes:
//!
//! - rendering `{placeholder}` templates (see [`crate::template`])
//! - retaining diagnostic data for `to_json()` and log records
//!
//! # Ownership
//!
//! The context is moved into the error at construction time. Once an error
//! exists its context is reachable only through `&ErrorContext`, so nothing
//! can mutate it afterwards. Callers that want to keep their own copy pass a
//! clone.
//!
//! # Example
//!
//! ```rust
//! use provenance_errors::ErrorContext;
//!
//! let ctx = ErrorContext::new()
//!     .with("path", "/var/cache/index")
//!     .with("attempt", 3);
//!
//! assert_eq!(ctx.len(), 2);
//! assert!(ctx.contains_key("attempt"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Ordered key/value diagnostics attached to an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorContext {
    entries: Map<String, Value>,
}

impl ErrorContext {
    /// Create an empty context.
    #[inline]
    pub fn new() -> Self {
        Self { entries: Map::new() }
    }

    /// Add an entry, replacing any previous value for `key`.
    #[inline]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert an entry in place.
    ///
    /// Only available while the context is still owned by the caller, i.e.
    /// before it is handed to an error.
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up a value. A present key with a `null` value returns `Some(&Value::Null)`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Key presence, regardless of value (including `null`).
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required keys that are absent from this context, in declaration order.
    pub fn missing_keys<'k>(&self, required: &'k [Cow<'static, str>]) -> SmallVec<[&'k str; 4]> {
        required
            .iter()
            .map(|key| key.as_ref())
            .filter(|key| !self.entries.contains_key(*key))
            .collect()
    }

    /// Borrow the underlying JSON map.
    #[inline]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// JSON object form of the context.
    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.clone())
    }

    /// Build a context from an untyped JSON value.
    ///
    /// Objects convert entry for entry; `null` yields an empty context.
    /// Any other value is not a context and returns `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(entries) => Some(Self { entries }),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for ErrorContext {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl<K, V> FromIterator<(K, V)> for ErrorContext
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_preserves_insertion_order() {
        let ctx = ErrorContext::new().with("b", 1).with("a", 2);
        let keys: Vec<_> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn null_values_count_as_present() {
        let ctx = ErrorContext::new().with("maybe", Value::Null);
        assert!(ctx.contains_key("maybe"));
        assert_eq!(ctx.get("maybe"), Some(&Value::Null));
    }

    #[test]
    fn missing_keys_in_declaration_order() {
        let ctx = ErrorContext::new().with("host", "db1");
        let required = [
            Cow::Borrowed("port"),
            Cow::Borrowed("host"),
            Cow::Owned(String::from("user")),
        ];
        let missing = ctx.missing_keys(&required);
        assert_eq!(missing.as_slice(), ["port", "user"]);
    }

    #[test]
    fn from_value_accepts_objects_and_null() {
        let ctx = ErrorContext::from_value(json!({"k": "v"})).unwrap();
        assert_eq!(ctx.get("k"), Some(&json!("v")));
        assert!(ErrorContext::from_value(Value::Null).unwrap().is_empty());
        assert!(ErrorContext::from_value(json!([1, 2])).is_none());
        assert!(ErrorContext::from_value(json!(7)).is_none());
    }

    #[test]
    fn serializes_as_plain_object() {
        let ctx: ErrorContext = [("reason", "timeout")].into_iter().collect();
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"reason": "timeout"}));
        assert_eq!(ctx.to_value(), json!({"reason": "timeout"}));
    }
}
