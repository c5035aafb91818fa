//! Error code grammar and subsystem namespaces.
//!
//! Every error kind is identified by a code matching `^[A-Z][A-Z0-9_]*$`:
//! an upper-case ASCII letter followed by upper-case letters, digits or
//! underscores. Codes are data, not types; subsystems differ only by the
//! codes and namespaces they declare.
//!
//! # Compile-time Checking
//!
//! [`is_valid_code`] is a `const fn`, so tables declared with
//! [`define_errors!`](crate::define_errors) reject malformed codes at
//! compile time:
//!
//! ```rust
//! use provenance_errors::codes::is_valid_code;
//!
//! const _: () = assert!(is_valid_code("CACHE_MISS"));
//! assert!(!is_valid_code("cache-miss"));
//! ```
//!
//! Definitions that arrive at runtime (JSON tables, user input) are checked
//! by [`validate`](crate::validate), which reports a malformed code as a
//! [`DefinitionProblem`](crate::DefinitionProblem) instead of panicking.

/// The code grammar, as shown in diagnostics.
pub const CODE_PATTERN: &str = "^[A-Z][A-Z0-9_]*$";

/// Check a code against [`CODE_PATTERN`].
///
/// Usable in const contexts. The empty string is not a valid code.
pub const fn is_valid_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_uppercase() {
        return false;
    }

    let mut i = 1;
    while i < bytes.len() {
        let b = bytes[i];
        if !(b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_') {
            return false;
        }
        i += 1;
    }
    true
}

/// Canonical subsystem namespaces known to this crate.
///
/// Subsystem labels are free-form strings; these constants only name the
/// ones the crate itself relies on.
pub mod namespaces {
    /// Built-in system errors, including the factory fallbacks.
    pub const SYS: &str = "SYS";

    /// Label used when a definition does not name its subsystem.
    pub const UNKNOWN: &str = "unknown";
}
