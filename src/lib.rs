//! # Provenance Errors
//!
//! Centrally declared error kinds, templated messages, contextual metadata
//! and inspectable cause chains.
//!
//! ## Design Philosophy
//!
//! 1. **Error kinds are data**: one [`StructuredError`] type; subsystems
//!    differ only by the [`ErrorDefinition`]s they declare
//! 2. **Every failure keeps its history**: each operation wraps whatever it
//!    caught as `original`, so the full chain is recoverable at the top
//! 3. **Construction never fails at the call site**: the factory degrades to
//!    well-known `SYS` fallbacks instead of returning an error
//! 4. **Strictness is explicit**: resolved once at the composition root and
//!    passed down as [`FactoryConfig`]
//!
//! ## Quick Start
//!
//! ```rust
//! use provenance_errors::{context, create_error, define_errors, Cause, StructuredError};
//!
//! define_errors! {
//!     "STORAGE" as STORAGE_ERRORS => {
//!         READ_FAILED = ("Could not read {path}", true, ["path"]),
//!     }
//! }
//!
//! fn read_config(path: &str) -> Result<String, StructuredError> {
//!     std::fs::read_to_string(path).map_err(|e| {
//!         create_error(&READ_FAILED, context! { "path" => path }, Some(Cause::foreign(e)))
//!     })
//! }
//!
//! let err = read_config("/definitely/not/here.toml").unwrap_err();
//! assert_eq!(err.code(), "READ_FAILED");
//! assert_eq!(err.message(), "Could not read /definitely/not/here.toml");
//! assert!(err.format().contains("\nCaused by: Error: "));
//! ```
//!
//! ## Strict and Lenient Construction
//!
//! Strict construction validates definitions and enforces required context
//! keys; lenient construction renders whatever it is given. Production is
//! lenient, everything else is strict:
//!
//! ```rust
//! use provenance_errors::{ErrorContext, ErrorDefinition, ErrorFactory, FactoryConfig, RuntimeMode};
//!
//! let def = ErrorDefinition::new("", "Only message");
//!
//! let strict = ErrorFactory::new(FactoryConfig::for_mode(RuntimeMode::Test));
//! assert_eq!(strict.create_error(&def, ErrorContext::new(), None).code(), "VALIDATION_FAILED");
//!
//! let lenient = ErrorFactory::new(FactoryConfig::for_mode(RuntimeMode::Production));
//! assert_eq!(lenient.create_error(&def, ErrorContext::new(), None).message(), "Only message");
//! ```
//!
//! ## Features
//!
//! - `stack-capture` (default): capture a call-site stack trace for every
//!   constructed error

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::result;

pub mod chain;
pub mod codes;
pub mod config;
pub mod context;
pub mod convenience;
pub mod definitions;
pub mod factory;
pub mod logging;
pub mod models;
pub mod registry;
pub mod sink;
pub mod stack;
pub mod template;
pub mod validation;

pub use chain::*;
pub use codes::*;
pub use config::*;
pub use context::*;
pub use factory::*;
pub use logging::*;
pub use models::*;
pub use registry::*;
pub use sink::*;
pub use stack::*;
pub use template::*;
pub use validation::*;

use serde_json::Value;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, StructuredError>;

// ============================================================================
// Construction Errors
// ============================================================================

/// Why a [`StructuredError`] could not be constructed.
///
/// These are plain errors, not structured ones. The factory never returns
/// them; it wraps them as the cause of a `SYS.UNEXPECTED` fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// An untyped definition has the wrong shape.
    #[error("Invalid error definition: {defect}")]
    InvalidDefinition {
        /// Which field is wrong.
        defect: &'static str,
    },

    /// Strict construction without every required context key.
    #[error(
        "Missing required context keys for {code}: {}. Context: {context}",
        .missing.join(", ")
    )]
    MissingContextKeys {
        /// Code of the definition being constructed.
        code: String,
        /// Required keys absent from the context, in declaration order.
        missing: Vec<String>,
        /// The supplied context, as JSON text.
        context: String,
    },
}

// ============================================================================
// Structured Error
// ============================================================================

/// One occurrence of a declared error kind.
///
/// Immutable after construction. Clones share the cause and the captured
/// stack.
#[derive(Clone)]
pub struct StructuredError {
    code: Cow<'static, str>,
    subsystem: Cow<'static, str>,
    docs: Option<Cow<'static, str>>,
    msg: Cow<'static, str>,
    message: String,
    context: ErrorContext,
    recoverable: bool,
    original: Option<Cause>,
    stack: StackTrace,
}

impl StructuredError {
    /// Type name used by `format()`, `to_json()` and the chain verifier.
    pub const TYPE_NAME: &'static str = "StructuredError";

    /// Construct directly from a definition.
    ///
    /// With `config.strict`, every key in `definition.context_keys` must be
    /// present in `context` (a `null` value counts as present).
    ///
    /// # Errors
    ///
    /// [`ConstructionError::MissingContextKeys`] listing the absent keys and
    /// echoing the full context.
    pub fn new(
        definition: &ErrorDefinition,
        context: ErrorContext,
        original: Option<Cause>,
        config: &FactoryConfig,
    ) -> result::Result<Self, ConstructionError> {
        Self::try_build(definition, context, original, config).map_err(|(err, _)| err)
    }

    /// Construct from an untyped JSON definition.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::InvalidDefinition`] when the definition is not
    /// an object or its fields have the wrong types, plus everything
    /// [`new`](Self::new) reports.
    pub fn from_value(
        definition: &Value,
        context: ErrorContext,
        original: Option<Cause>,
        config: &FactoryConfig,
    ) -> result::Result<Self, ConstructionError> {
        let definition = ErrorDefinition::from_value(definition)?;
        Self::new(&definition, context, original, config)
    }

    /// Construction that hands the context back on failure.
    pub(crate) fn try_build(
        definition: &ErrorDefinition,
        context: ErrorContext,
        original: Option<Cause>,
        config: &FactoryConfig,
    ) -> result::Result<Self, (ConstructionError, ErrorContext)> {
        let mut error = Self::assemble(definition, context, original);

        if config.strict && !definition.context_keys.is_empty() {
            let missing = error.context.missing_keys(&definition.context_keys);
            if !missing.is_empty() {
                let err = ConstructionError::MissingContextKeys {
                    code: definition.code.to_string(),
                    missing: missing.iter().map(|k| (*k).to_owned()).collect(),
                    context: error.context.to_value().to_string(),
                };
                return Err((err, error.context));
            }
        }

        error.stack = StackTrace::capture_if(config.capture_stack);
        Ok(error)
    }

    /// Infallible construction without any checks. Used for fallbacks.
    pub(crate) fn unchecked(
        definition: &ErrorDefinition,
        context: ErrorContext,
        original: Option<Cause>,
        config: &FactoryConfig,
    ) -> Self {
        let mut error = Self::assemble(definition, context, original);
        error.stack = StackTrace::capture_if(config.capture_stack);
        error
    }

    #[inline]
    fn assemble(definition: &ErrorDefinition, context: ErrorContext, original: Option<Cause>) -> Self {
        let message = template::render(&definition.message, &context);
        Self {
            code: definition.code.clone(),
            subsystem: definition.subsystem.clone(),
            docs: definition.docs.clone(),
            msg: definition.message.clone(),
            message,
            context,
            recoverable: definition.recoverable,
            original,
            stack: StackTrace::empty(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Code copied from the definition.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Subsystem copied from the definition.
    #[inline]
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Documentation pointer, if the definition had one.
    #[inline]
    pub fn docs(&self) -> Option<&str> {
        self.docs.as_deref()
    }

    /// The raw message template.
    #[inline]
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// The message rendered at construction.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The context this error was built with.
    #[inline]
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Whether callers may retry the failed operation.
    #[inline]
    pub fn recoverable(&self) -> bool {
        self.recoverable
    }

    /// The wrapped cause, if any.
    #[inline]
    pub fn original(&self) -> Option<&Cause> {
        self.original.as_ref()
    }

    /// Rendered call-site stack trace, if one was captured.
    #[inline]
    pub fn stack(&self) -> Option<&str> {
        self.stack.rendered()
    }

    /// The raw captured trace.
    #[inline]
    pub fn stack_trace(&self) -> &StackTrace {
        &self.stack
    }

    // ========================================================================
    // Presentation
    // ========================================================================

    /// Human-readable form with one level of cause.
    ///
    /// ```text
    /// StructuredError [CODE]: message
    /// Docs: <docs>
    /// Caused by: <cause type>: <cause message>
    /// ```
    ///
    /// The `Docs` and `Caused by` lines appear only when set. Deeper levels
    /// are available through [`chain`](Self::chain) or [`to_json`](Self::to_json).
    pub fn format(&self) -> String {
        use std::fmt::Write;

        let mut out = format!("{} [{}]: {}", Self::TYPE_NAME, self.code, self.message);
        if let Some(docs) = &self.docs {
            let _ = write!(out, "\nDocs: {}", docs);
        }
        if let Some(cause) = &self.original {
            let _ = write!(out, "\nCaused by: {}: {}", cause.type_name(), cause.message());
        }
        out
    }

    /// JSON record of this error and, recursively, its causes.
    ///
    /// Fields: `name, code, message, msg, subsystem, context, recoverable,
    /// docs, stack, original`. A structured cause nests its own record; a
    /// foreign cause becomes `{name, message, stack}`; no cause is `null`.
    pub fn to_json(&self) -> Value {
        self.record().to_value()
    }

    /// Borrowed, serializable view of this error.
    pub fn record(&self) -> ErrorRecord<'_> {
        ErrorRecord {
            name: Self::TYPE_NAME,
            code: &self.code,
            message: &self.message,
            msg: &self.msg,
            subsystem: &self.subsystem,
            context: &self.context,
            recoverable: self.recoverable,
            docs: self.docs.as_deref(),
            stack: self.stack.rendered(),
            original: self.original.as_ref().map(Cause::record),
        }
    }

    // ========================================================================
    // Chain Inspection
    // ========================================================================

    /// This error followed by each cause, top level first.
    pub fn chain(&self) -> Chain<'_> {
        Chain::new(Link::Structured(self))
    }

    /// The deepest level of the chain (this error when there is no cause).
    pub fn root_cause(&self) -> Link<'_> {
        let mut current = Link::Structured(self);
        while let Some(next) = current.next() {
            current = next;
        }
        current
    }

    /// Number of levels in the chain, this error included.
    pub fn depth(&self) -> usize {
        self.chain().count()
    }
}

impl fmt::Debug for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredError")
            .field("code", &self.code)
            .field("subsystem", &self.subsystem)
            .field("message", &self.message)
            .field("context", &self.context)
            .field("recoverable", &self.recoverable)
            .field("docs", &self.docs)
            .field("original", &self.original)
            .field("stack", &self.stack)
            .finish()
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for StructuredError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.original.as_ref().map(Cause::as_error)
    }
}
