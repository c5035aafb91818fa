//! Structured log records for structured errors.
//!
//! [`ErrorRecord`] borrows from the error that produced it and cannot
//! outlive it. It is the single log record handed to an external logger:
//!
//! - `serde` serialization gives the JSON object returned by `to_json()`
//! - [`ErrorRecord::write_to`] gives a one-line `key='value'` form with
//!   bounded field lengths
//! - [`StructuredError::emit`] sends the record through `tracing`
//!
//! Nothing in this crate logs on its own; emission is always the caller's
//! decision.

use crate::{ErrorContext, StructuredError};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Maximum length for any individual field in line output.
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Appended to truncated fields.
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Serializable view of one structured error and its causes.
#[derive(Debug, Serialize)]
pub struct ErrorRecord<'a> {
    /// Always `StructuredError`.
    pub name: &'static str,
    /// Error code.
    pub code: &'a str,
    /// Rendered message.
    pub message: &'a str,
    /// Unrendered template.
    pub msg: &'a str,
    /// Subsystem label.
    pub subsystem: &'a str,
    /// Context entries in insertion order.
    pub context: &'a ErrorContext,
    /// Retry hint.
    pub recoverable: bool,
    /// Documentation pointer.
    pub docs: Option<&'a str>,
    /// Rendered call-site trace.
    pub stack: Option<&'a str>,
    /// The wrapped cause.
    pub original: Option<CauseRecord<'a>>,
}

/// Serialized form of a cause: nested record or minimal projection.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CauseRecord<'a> {
    /// A structured cause, serialized in full.
    Structured(Box<ErrorRecord<'a>>),
    /// A foreign cause.
    Foreign(ForeignRecord<'a>),
}

/// `{name, message, stack}` projection of a foreign error.
#[derive(Debug, Serialize)]
pub struct ForeignRecord<'a> {
    /// Short type name.
    pub name: &'a str,
    /// `Display` output of the error.
    pub message: String,
    /// Foreign errors carry no trace.
    pub stack: Option<&'a str>,
}

impl ErrorRecord<'_> {
    /// JSON object form.
    pub fn to_value(&self) -> Value {
        // Every field is a string, bool, option or string-keyed map.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The same record with every level's stack trace removed.
    pub fn without_stack(mut self) -> Self {
        self.stack = None;
        self.original = self.original.map(|cause| match cause {
            CauseRecord::Structured(inner) => CauseRecord::Structured(Box::new((*inner).without_stack())),
            foreign => foreign,
        });
        self
    }

    /// Write the record as a single line without intermediate buffers.
    ///
    /// Causes are appended as `caused_by=` segments, one per level. Fields
    /// longer than 1024 bytes are truncated on a UTF-8 boundary.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] subsystem='{}' recoverable={} message='{}'",
            truncate_with_indicator(self.code),
            truncate_with_indicator(self.subsystem),
            self.recoverable,
            truncate_with_indicator(self.message),
        )?;

        for (key, value) in self.context.iter() {
            let text = crate::template::display_value(value).unwrap_or(Cow::Borrowed("null"));
            write!(f, " {}='{}'", key, truncate_with_indicator(&text))?;
        }

        if let Some(docs) = self.docs {
            write!(f, " docs='{}'", truncate_with_indicator(docs))?;
        }

        let mut cause = self.original.as_ref();
        while let Some(current) = cause {
            match current {
                CauseRecord::Structured(record) => {
                    write!(
                        f,
                        " caused_by=[{}] '{}'",
                        truncate_with_indicator(record.code),
                        truncate_with_indicator(record.message)
                    )?;
                    cause = record.original.as_ref();
                }
                CauseRecord::Foreign(record) => {
                    write!(
                        f,
                        " caused_by={} '{}'",
                        record.name,
                        truncate_with_indicator(&record.message)
                    )?;
                    cause = None;
                }
            }
        }

        Ok(())
    }
}

impl StructuredError {
    /// Send this error to the active `tracing` subscriber as one event.
    ///
    /// Recoverable errors are logged at `WARN`, all others at `ERROR`. The
    /// full JSON record travels in the `record` field.
    pub fn emit(&self) {
        let record = self.to_json().to_string();
        if self.recoverable() {
            tracing::warn!(
                code = %self.code(),
                subsystem = %self.subsystem(),
                recoverable = true,
                record = %record,
                "{}",
                self.message()
            );
        } else {
            tracing::error!(
                code = %self.code(),
                subsystem = %self.subsystem(),
                recoverable = false,
                record = %record,
                "{}",
                self.message()
            );
        }
    }
}

/// Truncate a field for line output.
///
/// Returns the input unchanged (borrowed) when it fits.
pub(crate) fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    truncate_to(s, MAX_FIELD_OUTPUT_LEN)
}

/// Truncate to at most `max_bytes`, indicator included, on a char boundary.
fn truncate_to(s: &str, max_bytes: usize) -> Cow<'_, str> {
    if s.len() <= max_bytes {
        return Cow::Borrowed(s);
    }
    if max_bytes <= TRUNCATION_INDICATOR.len() {
        return Cow::Borrowed(&TRUNCATION_INDICATOR[..max_bytes]);
    }

    let mut idx = max_bytes - TRUNCATION_INDICATOR.len();
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}
