//! Core data types: error definitions, causes and chain links.
//!
//! # Definitions
//!
//! An [`ErrorDefinition`] is the static description of one error kind. It is
//! passive data, compared by value, and usually declared as a `const` with
//! [`define_errors!`](crate::define_errors). Definitions can also be built at
//! runtime or deserialized from JSON subsystem tables.
//!
//! A definition with an empty `code` or `message` is representable on
//! purpose: lenient construction accepts it, strict construction reports it
//! through the validator.
//!
//! # Causes
//!
//! A [`Cause`] is the `original` link of a structured error. It is either
//! another [`StructuredError`] or any foreign `std::error::Error`. Both are
//! held behind `Arc`, so wrapping an error shares it instead of moving or
//! copying it:
//!
//! ```rust
//! use provenance_errors::Cause;
//! use std::sync::Arc;
//!
//! let io = Arc::new(std::io::Error::other("disk unplugged"));
//! let cause = Cause::foreign_arc(io.clone());
//!
//! assert_eq!(cause.type_name(), "Error");
//! assert_eq!(cause.message(), "disk unplugged");
//! assert!(cause.code().is_none());
//! ```

use crate::codes::namespaces;
use crate::logging::{CauseRecord, ForeignRecord};
use crate::{ConstructionError, StructuredError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Error Definition
// ============================================================================

/// Static description of one error kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    /// Unique identifier, `^[A-Z][A-Z0-9_]*$`. Empty means absent.
    #[serde(default)]
    pub code: Cow<'static, str>,
    /// Message template with `{name}` placeholders. Empty means absent.
    #[serde(default)]
    pub message: Cow<'static, str>,
    /// Free-form subsystem label.
    #[serde(default = "default_subsystem")]
    pub subsystem: Cow<'static, str>,
    /// Whether callers may retry the failed operation.
    #[serde(default = "default_recoverable")]
    pub recoverable: bool,
    /// Keys that must be present in the context under strict construction.
    #[serde(default, skip_serializing_if = "keys_are_empty")]
    pub context_keys: Cow<'static, [Cow<'static, str>]>,
    /// Opaque documentation pointer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<Cow<'static, str>>,
}

fn default_subsystem() -> Cow<'static, str> {
    Cow::Borrowed(namespaces::UNKNOWN)
}

fn default_recoverable() -> bool {
    true
}

fn keys_are_empty(keys: &Cow<'static, [Cow<'static, str>]>) -> bool {
    keys.is_empty()
}

impl ErrorDefinition {
    /// Minimal definition: unknown subsystem, recoverable, no required keys.
    pub const fn new(code: &'static str, message: &'static str) -> Self {
        Self::const_new(namespaces::UNKNOWN, code, message, true, &[], None)
    }

    /// Fully specified definition, usable in `const` items.
    ///
    /// This is what [`define_errors!`](crate::define_errors) expands to.
    pub const fn const_new(
        subsystem: &'static str,
        code: &'static str,
        message: &'static str,
        recoverable: bool,
        context_keys: &'static [Cow<'static, str>],
        docs: Option<&'static str>,
    ) -> Self {
        Self {
            code: Cow::Borrowed(code),
            message: Cow::Borrowed(message),
            subsystem: Cow::Borrowed(subsystem),
            recoverable,
            context_keys: Cow::Borrowed(context_keys),
            docs: match docs {
                Some(docs) => Some(Cow::Borrowed(docs)),
                None => None,
            },
        }
    }

    /// Set the subsystem label.
    pub fn with_subsystem(mut self, subsystem: impl Into<Cow<'static, str>>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Set the recoverable flag.
    pub fn with_recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = recoverable;
        self
    }

    /// Replace the required context keys.
    pub fn with_context_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Cow<'static, str>>,
    {
        self.context_keys = Cow::Owned(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set the documentation pointer.
    pub fn with_docs(mut self, docs: impl Into<Cow<'static, str>>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    /// JSON object form, as embedded in fallback error contexts.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("code".into(), Value::String(self.code.to_string()));
        map.insert("message".into(), Value::String(self.message.to_string()));
        map.insert("subsystem".into(), Value::String(self.subsystem.to_string()));
        map.insert("recoverable".into(), Value::Bool(self.recoverable));
        map.insert(
            "context_keys".into(),
            Value::Array(
                self.context_keys
                    .iter()
                    .map(|k| Value::String(k.to_string()))
                    .collect(),
            ),
        );
        map.insert(
            "docs".into(),
            self.docs
                .as_ref()
                .map_or(Value::Null, |d| Value::String(d.to_string())),
        );
        Value::Object(map)
    }

    /// Convert an untyped JSON definition.
    ///
    /// Absent or `null` code/message become empty strings. Optional fields
    /// of the wrong type fall back to their defaults, except `context_keys`,
    /// whose entries must all be strings.
    ///
    /// # Errors
    ///
    /// Fails when the value is not an object, or when `code`, `message` or a
    /// context key is present with a non-string value.
    pub fn from_value(value: &Value) -> Result<Self, ConstructionError> {
        let Value::Object(map) = value else {
            return Err(ConstructionError::InvalidDefinition {
                defect: "definition must be an object",
            });
        };

        let code = required_string(map, "code").ok_or(ConstructionError::InvalidDefinition {
            defect: "definition.code must be a string",
        })?;
        let message =
            required_string(map, "message").ok_or(ConstructionError::InvalidDefinition {
                defect: "definition.message must be a string",
            })?;

        let subsystem = match map.get("subsystem") {
            Some(Value::String(s)) => Cow::Owned(s.clone()),
            _ => default_subsystem(),
        };
        let recoverable = map
            .get("recoverable")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let context_keys = match map.get("context_keys") {
            Some(Value::Array(keys)) => keys
                .iter()
                .map(|k| k.as_str().map(|s| Cow::Owned(s.to_owned())))
                .collect::<Option<Vec<_>>>()
                .ok_or(ConstructionError::InvalidDefinition {
                    defect: "definition.context_keys must only contain strings",
                })?,
            _ => Vec::new(),
        };

        let docs = map
            .get("docs")
            .and_then(Value::as_str)
            .map(|d| Cow::Owned(d.to_owned()));

        Ok(Self {
            code,
            message,
            subsystem,
            recoverable,
            context_keys: Cow::Owned(context_keys),
            docs,
        })
    }
}

impl Default for ErrorDefinition {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// `None` when the field is present with a non-string value.
fn required_string(map: &Map<String, Value>, field: &str) -> Option<Cow<'static, str>> {
    match map.get(field) {
        None | Some(Value::Null) => Some(Cow::Borrowed("")),
        Some(Value::String(s)) => Some(Cow::Owned(s.clone())),
        Some(_) => None,
    }
}

// ============================================================================
// Causes
// ============================================================================

/// The `original` link of a structured error.
#[derive(Clone)]
pub enum Cause {
    /// Another structured error; serializes recursively.
    Structured(Arc<StructuredError>),
    /// Any other error; serializes as a `{name, message, stack}` projection.
    Foreign(ForeignCause),
}

/// A non-structured cause together with its type name.
#[derive(Clone)]
pub struct ForeignCause {
    type_name: Cow<'static, str>,
    error: Arc<dyn Error + Send + Sync + 'static>,
}

impl ForeignCause {
    /// Short type name of the wrapped error (`Error` for `std::io::Error`).
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The wrapped error.
    #[inline]
    pub fn error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.error.as_ref()
    }
}

impl Cause {
    /// Wrap a structured error.
    pub fn structured(error: impl Into<Arc<StructuredError>>) -> Self {
        Self::Structured(error.into())
    }

    /// Wrap any foreign error, recording its type name.
    pub fn foreign<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::foreign_arc(Arc::new(error))
    }

    /// Wrap a foreign error that is already shared.
    pub fn foreign_arc<E>(error: Arc<E>) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::Foreign(ForeignCause {
            type_name: Cow::Borrowed(short_type_name::<E>()),
            error,
        })
    }

    /// Wrap a type-erased foreign error under an explicit type name.
    pub fn foreign_named(
        type_name: impl Into<Cow<'static, str>>,
        error: Arc<dyn Error + Send + Sync + 'static>,
    ) -> Self {
        Self::Foreign(ForeignCause {
            type_name: type_name.into(),
            error,
        })
    }

    /// Type name used by `format()` and the chain verifier.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Structured(_) => StructuredError::TYPE_NAME,
            Self::Foreign(foreign) => foreign.type_name(),
        }
    }

    /// Error code, only present on structured causes.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Structured(err) => Some(err.code()),
            Self::Foreign(_) => None,
        }
    }

    /// Rendered message of the cause.
    pub fn message(&self) -> Cow<'_, str> {
        match self {
            Self::Structured(err) => Cow::Borrowed(err.message()),
            Self::Foreign(foreign) => Cow::Owned(foreign.error.to_string()),
        }
    }

    /// Next link; foreign causes end the chain.
    pub fn original(&self) -> Option<&Cause> {
        match self {
            Self::Structured(err) => err.original(),
            Self::Foreign(_) => None,
        }
    }

    /// Structured view of this cause, if it is one.
    pub fn as_structured(&self) -> Option<&StructuredError> {
        match self {
            Self::Structured(err) => Some(err),
            Self::Foreign(_) => None,
        }
    }

    /// The cause as a plain `std::error::Error`.
    pub fn as_error(&self) -> &(dyn Error + 'static) {
        match self {
            Self::Structured(err) => &**err,
            Self::Foreign(foreign) => &*foreign.error,
        }
    }

    /// Whether both causes share the same allocation.
    pub fn same_as(&self, other: &Cause) -> bool {
        match (self, other) {
            (Self::Structured(a), Self::Structured(b)) => Arc::ptr_eq(a, b),
            (Self::Foreign(a), Self::Foreign(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(&a.error), Arc::as_ptr(&b.error))
            }
            _ => false,
        }
    }

    /// Chain view of this cause.
    #[inline]
    pub fn link(&self) -> Link<'_> {
        match self {
            Self::Structured(err) => Link::Structured(err),
            Self::Foreign(foreign) => Link::Foreign(foreign),
        }
    }

    /// Serializable record of this cause.
    pub fn record(&self) -> CauseRecord<'_> {
        match self {
            Self::Structured(err) => CauseRecord::Structured(Box::new(err.record())),
            Self::Foreign(foreign) => CauseRecord::Foreign(ForeignRecord {
                name: foreign.type_name(),
                message: foreign.error.to_string(),
                stack: None,
            }),
        }
    }
}

impl From<StructuredError> for Cause {
    fn from(error: StructuredError) -> Self {
        Self::Structured(Arc::new(error))
    }
}

impl From<Arc<StructuredError>> for Cause {
    fn from(error: Arc<StructuredError>) -> Self {
        Self::Structured(error)
    }
}

impl From<ConstructionError> for Cause {
    fn from(error: ConstructionError) -> Self {
        Self::foreign(error)
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(err) => f.debug_tuple("Structured").field(err).finish(),
            Self::Foreign(foreign) => f
                .debug_struct("Foreign")
                .field("type_name", &foreign.type_name)
                .field("error", &foreign.error)
                .finish(),
        }
    }
}

/// Last path segment of a type name, without generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ============================================================================
// Chain Links
// ============================================================================

/// Borrowed view of one level of a cause chain.
#[derive(Debug, Clone, Copy)]
pub enum Link<'a> {
    /// A structured level.
    Structured(&'a StructuredError),
    /// A foreign level; always the last one.
    Foreign(&'a ForeignCause),
}

impl<'a> Link<'a> {
    /// Type name of this level.
    pub fn type_name(&self) -> &'a str {
        match self {
            Self::Structured(_) => StructuredError::TYPE_NAME,
            Self::Foreign(foreign) => foreign.type_name(),
        }
    }

    /// Code of a structured level.
    pub fn code(&self) -> Option<&'a str> {
        match self {
            Self::Structured(err) => Some(err.code()),
            Self::Foreign(_) => None,
        }
    }

    /// Rendered message of this level.
    pub fn message(&self) -> Cow<'a, str> {
        match self {
            Self::Structured(err) => Cow::Borrowed(err.message()),
            Self::Foreign(foreign) => Cow::Owned(foreign.error.to_string()),
        }
    }

    /// The level below this one.
    pub fn next(&self) -> Option<Link<'a>> {
        match self {
            Self::Structured(err) => err.original().map(Cause::link),
            Self::Foreign(_) => None,
        }
    }
}

impl fmt::Debug for ForeignCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignCause")
            .field("type_name", &self.type_name)
            .field("error", &self.error)
            .finish()
    }
}

/// Iterator over a chain, top level first.
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    next: Option<Link<'a>>,
}

impl<'a> Chain<'a> {
    pub(crate) fn new(start: Link<'a>) -> Self {
        Self { next: Some(start) }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = Link<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.next();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct DiskFault;

    impl fmt::Display for DiskFault {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "disk fault")
        }
    }

    impl Error for DiskFault {}

    #[test]
    fn new_applies_defaults() {
        let def = ErrorDefinition::new("CODE", "msg");
        assert_eq!(def.subsystem, "unknown");
        assert!(def.recoverable);
        assert!(def.context_keys.is_empty());
        assert!(def.docs.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let def = ErrorDefinition::new("CODE", "msg")
            .with_subsystem("CACHE")
            .with_recoverable(false)
            .with_context_keys(["key", "shard"])
            .with_docs("https://docs.example/cache");
        assert_eq!(def.subsystem, "CACHE");
        assert!(!def.recoverable);
        assert_eq!(def.context_keys.len(), 2);
        assert_eq!(def.docs.as_deref(), Some("https://docs.example/cache"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let def: ErrorDefinition = serde_json::from_value(json!({"message": "Only message"})).unwrap();
        assert_eq!(def.code, "");
        assert_eq!(def.message, "Only message");
        assert_eq!(def.subsystem, "unknown");
        assert!(def.recoverable);
    }

    #[test]
    fn from_value_rejects_non_string_fields() {
        assert!(ErrorDefinition::from_value(&json!({"code": 42, "message": "m"})).is_err());
        assert!(ErrorDefinition::from_value(&json!({"code": "A", "message": ["m"]})).is_err());
        assert!(ErrorDefinition::from_value(&json!({"code": "A", "message": "m", "context_keys": [1]})).is_err());
        assert!(ErrorDefinition::from_value(&json!("A")).is_err());
    }

    #[test]
    fn from_value_accepts_partial_definitions() {
        let def = ErrorDefinition::from_value(&json!({
            "code": "A",
            "message": "m {k}",
            "subsystem": "NET",
            "recoverable": false,
            "context_keys": ["k"],
            "docs": "d"
        }))
        .unwrap();
        assert_eq!(def.subsystem, "NET");
        assert!(!def.recoverable);
        assert_eq!(def.context_keys.as_ref(), [Cow::Borrowed("k")]);
        assert_eq!(def.docs.as_deref(), Some("d"));

        let bare = ErrorDefinition::from_value(&json!({})).unwrap();
        assert_eq!(bare, ErrorDefinition::default());
    }

    #[test]
    fn to_value_lists_every_field() {
        let value = ErrorDefinition::new("A", "m").to_value();
        assert_eq!(value["code"], "A");
        assert_eq!(value["context_keys"], json!([]));
        assert_eq!(value["docs"], Value::Null);
    }

    #[test]
    fn foreign_cause_records_short_type_name() {
        let cause = Cause::foreign(DiskFault);
        assert_eq!(cause.type_name(), "DiskFault");
        assert_eq!(cause.message(), "disk fault");
        assert!(cause.original().is_none());
        assert!(cause.as_structured().is_none());
    }

    #[test]
    fn same_as_compares_allocations() {
        let shared = Arc::new(DiskFault);
        let a = Cause::foreign_arc(shared.clone());
        let b = Cause::foreign_arc(shared);
        let c = Cause::foreign(DiskFault);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&c));
    }

    #[test]
    fn foreign_record_is_minimal_projection() {
        let cause = Cause::foreign(DiskFault);
        let value = serde_json::to_value(cause.record()).unwrap();
        assert_eq!(value, json!({"name": "DiskFault", "message": "disk fault", "stack": null}));
    }

    #[test]
    fn named_foreign_cause_keeps_given_name() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(DiskFault);
        let cause = Cause::foreign_named("StorageFault", Arc::from(boxed));

        assert_eq!(cause.type_name(), "StorageFault");
        assert_eq!(cause.message(), "disk fault");
        assert_eq!(cause.link().type_name(), "StorageFault");
        let value = serde_json::to_value(cause.record()).unwrap();
        assert_eq!(value["name"], "StorageFault");
    }
}
