//! Built-in definitions of the `SYS` namespace.
//!
//! # Fallbacks
//!
//! Two of these are load-bearing for the factory:
//!
//! - [`VALIDATION_FAILED`] replaces an error whose definition is malformed
//!   (strict mode only)
//! - [`UNEXPECTED`] replaces an error whose construction failed, with the
//!   construction failure as its cause
//!
//! The factory assembles both without validation, so they must stay
//! well-formed. The `tests` module at the bottom of this file enforces that.
//!
//! # General purpose
//!
//! The remaining definitions cover failures common to every subsystem and
//! can be used directly:
//!
//! ```rust
//! use provenance_errors::{context, create_error, definitions};
//!
//! let err = create_error(
//!     &definitions::TIMEOUT,
//!     context! { "operation" => "fetch_profile", "timeout_ms" => 250 },
//!     None,
//! );
//! assert_eq!(err.message(), "Operation fetch_profile timed out after 250ms");
//! assert!(err.recoverable());
//! ```

use crate::codes::namespaces;
use crate::registry::SubsystemTable;

// -----------------------------------------------------------------------------
// SYS - Cross-cutting failures and factory fallbacks
// -----------------------------------------------------------------------------
crate::define_errors! {
    "SYS" as SYS => {
        /// Catch-all for failures with no more specific kind.
        UNEXPECTED = ("An unexpected error occurred: {reason}", false, ["reason"]),
        /// A malformed error definition reached the factory.
        VALIDATION_FAILED = ("Validation failed: {reason}", false, ["reason"]),
        /// A code path that exists but is not built yet.
        NOT_IMPLEMENTED = ("{feature} is not implemented", false, ["feature"]),
        /// A caller passed an unusable argument.
        INVALID_ARGUMENT = ("Invalid argument '{argument}': {reason}", false, ["argument"]),
        /// An operation exceeded its deadline.
        TIMEOUT = ("Operation {operation} timed out after {timeout_ms}ms", true, ["operation"]),
        /// Configuration could not be loaded or is inconsistent.
        CONFIGURATION_INVALID = ("Invalid configuration: {reason}", false, ["reason"]),
    }
}

/// The `SYS` table, ready to merge into a [`Registry`](crate::Registry).
pub fn sys_table() -> SubsystemTable {
    SubsystemTable::from_definitions(namespaces::SYS, SYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn every_builtin_is_well_formed() {
        for definition in SYS {
            assert!(validate(definition).is_empty(), "{}", definition.code);
            assert_eq!(definition.subsystem, namespaces::SYS);
        }
    }

    #[test]
    fn fallbacks_require_only_reason() {
        assert_eq!(UNEXPECTED.context_keys.as_ref(), ["reason"]);
        assert_eq!(VALIDATION_FAILED.context_keys.as_ref(), ["reason"]);
        assert!(!UNEXPECTED.recoverable);
        assert!(!VALIDATION_FAILED.recoverable);
    }

    #[test]
    fn sys_table_uses_codes_as_names() {
        let table = sys_table();
        assert_eq!(table.namespace(), "SYS");
        assert_eq!(table.len(), SYS.len());
        assert!(table.iter().all(|(name, def)| name == def.code));
    }
}
