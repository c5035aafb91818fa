//! Cause-chain verification for test suites.
//!
//! A chain is walked top-down in lockstep with a slice of [`ExpectedLevel`]s.
//! Every field of a level is optional; an empty level matches anything. The
//! walk stops at the first mismatch and reports it as a [`ChainMismatch`].
//!
//! ```rust
//! use provenance_errors::{check_chain, create_error, Cause, ErrorContext, ErrorDefinition, ExpectedLevel};
//!
//! let io = std::io::Error::other("Connection reset");
//! let low = create_error(&ErrorDefinition::new("B", "read failed"), ErrorContext::new(), Some(Cause::foreign(io)));
//! let top = create_error(&ErrorDefinition::new("A", "sync failed"), ErrorContext::new(), Some(low.into()));
//!
//! check_chain(&top, &[
//!     ExpectedLevel::code("A"),
//!     ExpectedLevel::code("B").with_message("READ"),
//!     ExpectedLevel::type_name("Error").with_message("reset"),
//! ])
//! .unwrap();
//! ```

use crate::models::{Cause, Link};
use crate::StructuredError;
use smallvec::SmallVec;
use std::borrow::Cow;
use thiserror::Error;

/// Predicate for one level of a cause chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedLevel {
    code: Option<Cow<'static, str>>,
    type_name: Option<Cow<'static, str>>,
    fragments: SmallVec<[Cow<'static, str>; 2]>,
}

impl ExpectedLevel {
    /// A level that matches anything.
    pub fn any() -> Self {
        Self::default()
    }

    /// A level with the given code.
    pub fn code(code: impl Into<Cow<'static, str>>) -> Self {
        Self::any().with_code(code)
    }

    /// A level with the given type name.
    pub fn type_name(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self::any().with_type_name(type_name)
    }

    /// Require this code.
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Require this type name.
    pub fn with_type_name(mut self, type_name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Add a message fragment, matched case-insensitively.
    pub fn with_message(mut self, fragment: impl Into<Cow<'static, str>>) -> Self {
        self.fragments.push(fragment.into());
        self
    }

    /// Add several message fragments; all of them must be present.
    pub fn with_messages<I, F>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Cow<'static, str>>,
    {
        self.fragments.extend(fragments.into_iter().map(Into::into));
        self
    }

    fn check(&self, index: usize, link: Link<'_>) -> Result<(), ChainMismatch> {
        if let Some(expected) = &self.code {
            let actual = link.code();
            if actual != Some(expected.as_ref()) {
                return Err(ChainMismatch::CodeMismatch {
                    level: index,
                    expected: expected.to_string(),
                    actual: actual.map(str::to_owned),
                });
            }
        }

        if let Some(expected) = &self.type_name {
            if link.type_name() != expected.as_ref() {
                return Err(ChainMismatch::TypeMismatch {
                    level: index,
                    expected: expected.to_string(),
                    actual: link.type_name().to_owned(),
                });
            }
        }

        if !self.fragments.is_empty() {
            let message = link.message();
            let haystack = message.to_lowercase();
            if let Some(missing) = self
                .fragments
                .iter()
                .find(|fragment| !haystack.contains(&fragment.to_lowercase()))
            {
                return Err(ChainMismatch::MessageFragmentMissing {
                    level: index,
                    fragment: missing.to_string(),
                    message: message.into_owned(),
                });
            }
        }

        Ok(())
    }
}

/// Why a chain did not match its expected levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainMismatch {
    /// The chain is shorter than expected.
    #[error("cause chain ended at level {level}, expected {expected} levels")]
    EndedEarly {
        /// Level at which the chain ran out.
        level: usize,
        /// Number of expected levels.
        expected: usize,
    },

    /// A level has a different code, or none at all.
    #[error(
        "level {level}: expected code '{expected}', found {}",
        .actual.as_deref().map_or_else(|| String::from("no code"), |c| format!("'{c}'"))
    )]
    CodeMismatch {
        /// Zero-based level, counted from the top error.
        level: usize,
        /// Code the level should carry.
        expected: String,
        /// Code it carries, `None` for foreign causes.
        actual: Option<String>,
    },

    /// A level has a different type name.
    #[error("level {level}: expected type '{expected}', found '{actual}'")]
    TypeMismatch {
        /// Zero-based level, counted from the top error.
        level: usize,
        /// Type name the level should have.
        expected: String,
        /// Type name it has.
        actual: String,
    },

    /// A message fragment is not contained in the level's message.
    #[error("level {level}: message '{message}' does not contain '{fragment}'")]
    MessageFragmentMissing {
        /// Zero-based level, counted from the top error.
        level: usize,
        /// Fragment that was searched for.
        fragment: String,
        /// The level's full message.
        message: String,
    },

    /// The chain continues past the last expected level.
    #[error(
        "actual chain has more levels than expected ({expected}); extra level is {type_name}{} '{message}'",
        .code.as_deref().map_or_else(String::new, |c| format!(" [{c}]"))
    )]
    LongerThanExpected {
        /// Number of expected levels.
        expected: usize,
        /// Type name of the first unexpected level.
        type_name: String,
        /// Its code, if it is a structured error.
        code: Option<String>,
        /// Its message.
        message: String,
    },
}

/// Verify the chain starting at `error`.
///
/// # Errors
///
/// Returns the first mismatch found, walking top-down.
pub fn check_chain(error: &StructuredError, expected: &[ExpectedLevel]) -> Result<(), ChainMismatch> {
    walk(Link::Structured(error), expected)
}

/// Verify the chain starting at an arbitrary cause.
///
/// # Errors
///
/// Same as [`check_chain`].
pub fn check_cause_chain(cause: &Cause, expected: &[ExpectedLevel]) -> Result<(), ChainMismatch> {
    walk(cause.link(), expected)
}

fn walk(start: Link<'_>, expected: &[ExpectedLevel]) -> Result<(), ChainMismatch> {
    let mut current = Some(start);

    for (index, level) in expected.iter().enumerate() {
        let Some(link) = current else {
            return Err(ChainMismatch::EndedEarly {
                level: index,
                expected: expected.len(),
            });
        };
        level.check(index, link)?;
        current = link.next();
    }

    match current {
        None => Ok(()),
        Some(extra) => Err(ChainMismatch::LongerThanExpected {
            expected: expected.len(),
            type_name: extra.type_name().to_owned(),
            code: extra.code().map(str::to_owned),
            message: extra.message().into_owned(),
        }),
    }
}
