//! The error factory: validation, templating and construction that never
//! fails.
//!
//! Whatever goes wrong while building an error, the caller still gets a
//! usable [`StructuredError`]. Failures are signalled by its code instead:
//!
//! | Situation                                   | Result code          | `original`              |
//! |---------------------------------------------|----------------------|-------------------------|
//! | valid definition, construction succeeded    | the definition's     | the supplied cause      |
//! | strict mode, definition has problems        | `VALIDATION_FAILED`  | the supplied cause      |
//! | construction failed (e.g. missing keys)     | `UNEXPECTED`         | the construction error  |
//!
//! ```rust
//! use provenance_errors::{context, ErrorDefinition, ErrorFactory, FactoryConfig};
//!
//! let factory = ErrorFactory::new(FactoryConfig::new(true));
//! let def = ErrorDefinition::new("QUOTA_EXCEEDED", "Quota of {limit} exceeded")
//!     .with_context_keys(["limit"]);
//!
//! let ok = factory.create_error(&def, context! { "limit" => 10 }, None);
//! assert_eq!(ok.message(), "Quota of 10 exceeded");
//!
//! let degraded = factory.create_error(&def, context! {}, None);
//! assert_eq!(degraded.code(), "UNEXPECTED");
//! assert_eq!(degraded.original().unwrap().type_name(), "ConstructionError");
//! ```

use crate::definitions::{UNEXPECTED, VALIDATION_FAILED};
use crate::validation::{DefinitionProblem, problems_text, validate, validate_value};
use crate::{Cause, ConstructionError, ErrorContext, ErrorDefinition, FactoryConfig, StructuredError};
use serde_json::Value;

/// Reason recorded on `VALIDATION_FAILED` fallbacks.
pub const INVALID_DEFINITION_REASON: &str = "Invalid error definition provided to createError";

/// Per-call overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Overrides the factory's configured strictness when set.
    pub strict: Option<bool>,
}

impl CreateOptions {
    /// Force strict construction.
    #[inline]
    pub const fn strict() -> Self {
        Self { strict: Some(true) }
    }

    /// Force lenient construction.
    #[inline]
    pub const fn lenient() -> Self {
        Self { strict: Some(false) }
    }
}

/// Builds structured errors under one configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFactory {
    config: FactoryConfig,
}

impl ErrorFactory {
    /// Factory with an explicit configuration.
    #[inline]
    pub const fn new(config: FactoryConfig) -> Self {
        Self { config }
    }

    /// Factory configured from the process environment.
    ///
    /// See [`FactoryConfig::from_env_lossy`].
    pub fn from_env_lossy() -> Self {
        Self::new(FactoryConfig::from_env_lossy())
    }

    /// The configuration this factory was built with.
    #[inline]
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Create an error with the factory's default strictness.
    pub fn create_error(
        &self,
        definition: &ErrorDefinition,
        context: ErrorContext,
        original: Option<Cause>,
    ) -> StructuredError {
        self.create_error_with(definition, context, original, CreateOptions::default())
    }

    /// Create an error with per-call options.
    pub fn create_error_with(
        &self,
        definition: &ErrorDefinition,
        context: ErrorContext,
        original: Option<Cause>,
        options: CreateOptions,
    ) -> StructuredError {
        let config = self.effective(options);

        if config.strict {
            let problems = validate(definition);
            if !problems.is_empty() {
                return validation_failed(&problems, definition.to_value(), original, &config);
            }
        }

        construct(definition, context, original, &config, || definition.to_value())
    }

    /// Create an error from an untyped JSON definition.
    ///
    /// Same algorithm as [`create_error_with`](Self::create_error_with), with
    /// the untyped validator. A definition that passes (or skips) validation
    /// but cannot be converted degrades to `UNEXPECTED`.
    pub fn create_error_from_value(
        &self,
        definition: &Value,
        context: ErrorContext,
        original: Option<Cause>,
        options: CreateOptions,
    ) -> StructuredError {
        let config = self.effective(options);

        if config.strict {
            let problems = validate_value(Some(definition));
            if !problems.is_empty() {
                return validation_failed(&problems, definition.clone(), original, &config);
            }
        }

        match ErrorDefinition::from_value(definition) {
            Ok(typed) => construct(&typed, context, original, &config, || definition.clone()),
            Err(err) => unexpected(err, definition.clone(), context, &config),
        }
    }

    #[inline]
    fn effective(&self, options: CreateOptions) -> FactoryConfig {
        FactoryConfig {
            strict: options.strict.unwrap_or(self.config.strict),
            ..self.config
        }
    }
}

/// Create an error with the default (strict) factory.
pub fn create_error(
    definition: &ErrorDefinition,
    context: ErrorContext,
    original: Option<Cause>,
) -> StructuredError {
    ErrorFactory::default().create_error(definition, context, original)
}

/// Create an error from an untyped definition with the default factory.
pub fn create_error_from_value(
    definition: &Value,
    context: ErrorContext,
    original: Option<Cause>,
) -> StructuredError {
    ErrorFactory::default().create_error_from_value(definition, context, original, CreateOptions::default())
}

fn construct<F>(
    definition: &ErrorDefinition,
    context: ErrorContext,
    original: Option<Cause>,
    config: &FactoryConfig,
    definition_json: F,
) -> StructuredError
where
    F: FnOnce() -> Value,
{
    match StructuredError::try_build(definition, context, original, config) {
        Ok(error) => error,
        Err((err, context)) => unexpected(err, definition_json(), context, config),
    }
}

fn validation_failed(
    problems: &[DefinitionProblem],
    definition: Value,
    original: Option<Cause>,
    config: &FactoryConfig,
) -> StructuredError {
    let context = ErrorContext::new()
        .with("reason", INVALID_DEFINITION_REASON)
        .with(
            "problems",
            problems
                .iter()
                .map(|p| Value::String(p.to_string()))
                .collect::<Vec<_>>(),
        )
        .with("problemsText", problems_text(problems))
        .with("invalidDefinition", definition);

    StructuredError::unchecked(&VALIDATION_FAILED, context, original, config)
}

fn unexpected(
    err: ConstructionError,
    definition: Value,
    context: ErrorContext,
    config: &FactoryConfig,
) -> StructuredError {
    let fallback_context = ErrorContext::new()
        .with("reason", err.to_string())
        .with("failedDefinition", definition)
        .with("failedContext", context.to_value());

    StructuredError::unchecked(&UNEXPECTED, fallback_context, Some(Cause::from(err)), config)
}
