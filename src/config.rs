//! Factory configuration and runtime-mode resolution.
//!
//! Strictness is an explicit value. The error factory and the entity
//! constructor never look at the environment; the composition root resolves
//! the runtime mode once and hands the result down:
//!
//! ```rust
//! use provenance_errors::{ErrorFactory, FactoryConfig, RuntimeMode};
//!
//! // Typically: FactoryConfig::from_env_lossy() in main().
//! let config = FactoryConfig::for_mode(RuntimeMode::Production);
//! assert!(!config.strict);
//!
//! let factory = ErrorFactory::new(config);
//! assert!(!factory.config().strict);
//! ```
//!
//! # Environment
//!
//! | Variable                   | Meaning                                         |
//! |----------------------------|-------------------------------------------------|
//! | `PROVENANCE_ENV`           | runtime mode (`production`, `development`, `test`) |
//! | `APP_ENV`                  | fallback when `PROVENANCE_ENV` is unset         |
//! | `PROVENANCE_CAPTURE_STACK` | `0`/`false`/`off` disables stack capture        |
//!
//! Non-production modes are strict; production is lenient.

use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Primary runtime-mode variable.
pub const MODE_ENV_VAR: &str = "PROVENANCE_ENV";

/// Fallback runtime-mode variable.
pub const MODE_ENV_FALLBACK: &str = "APP_ENV";

/// Stack capture switch.
pub const CAPTURE_STACK_ENV_VAR: &str = "PROVENANCE_CAPTURE_STACK";

/// Deployment mode of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuntimeMode {
    /// Live deployment; lenient construction.
    Production,
    /// Local development; strict construction.
    #[default]
    Development,
    /// Test suites; strict construction.
    Test,
}

impl RuntimeMode {
    /// Whether errors should be constructed strictly in this mode.
    #[inline]
    pub const fn is_strict(self) -> bool {
        !matches!(self, Self::Production)
    }

    /// Lowercase name of the mode.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Development => "development",
            Self::Test => "test",
        }
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "test" | "testing" => Ok(Self::Test),
            _ => Err(ConfigError::UnknownMode {
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The runtime-mode variable holds an unrecognized value.
    #[error("unknown runtime mode '{value}' (expected production, development or test)")]
    UnknownMode {
        /// The rejected value.
        value: String,
    },
}

/// Settings threaded through the factory and the entity constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Validate definitions and enforce required context keys.
    pub strict: bool,
    /// Capture a stack trace for every constructed error.
    pub capture_stack: bool,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            strict: true,
            capture_stack: true,
        }
    }
}

impl FactoryConfig {
    /// Strict or lenient configuration.
    #[inline]
    pub const fn new(strict: bool) -> Self {
        Self {
            strict,
            capture_stack: true,
        }
    }

    /// Configuration implied by a runtime mode.
    #[inline]
    pub const fn for_mode(mode: RuntimeMode) -> Self {
        Self::new(mode.is_strict())
    }

    /// Disable or enable stack capture.
    #[inline]
    pub const fn with_capture_stack(mut self, capture_stack: bool) -> Self {
        self.capture_stack = capture_stack;
        self
    }

    /// Resolve the configuration from the process environment.
    ///
    /// An unset mode means development.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMode`] when the mode variable is set to
    /// an unrecognized value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), treating unknown modes as development.
    pub fn from_env_lossy() -> Self {
        Self::from_env().unwrap_or_else(|_| {
            Self::for_mode(RuntimeMode::Development).with_capture_stack(capture_flag(
                env::var(CAPTURE_STACK_ENV_VAR).ok().as_deref(),
            ))
        })
    }

    /// Resolve from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(MODE_ENV_VAR).or_else(|| lookup(MODE_ENV_FALLBACK)) {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => RuntimeMode::default(),
        };
        let capture = capture_flag(lookup(CAPTURE_STACK_ENV_VAR).as_deref());
        Ok(Self::for_mode(mode).with_capture_stack(capture))
    }
}

fn capture_flag(value: Option<&str>) -> bool {
    !matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("0" | "false" | "off" | "no")
    )
}
