//! Convenience macros for declaring definitions and building errors.
//!
//! # Usage
//!
//! ```rust
//! use provenance_errors::{context, create_error, define_errors};
//!
//! define_errors! {
//!     "CACHE" as CACHE_ERRORS => {
//!         CACHE_MISS = ("No entry for {key}", true, ["key"]),
//!         CACHE_CORRUPT = ("Shard {shard} failed checksum", false, ["shard"], docs = "runbook/cache#corrupt"),
//!     }
//! }
//!
//! let err = create_error(&CACHE_MISS, context! { "key" => "user:42" }, None);
//! assert_eq!(err.message(), "No entry for user:42");
//! assert_eq!(CACHE_ERRORS.len(), 2);
//! ```
//!
//! Codes are the identifiers themselves and are checked against the code
//! grammar at compile time:
//!
//! ```rust,compile_fail
//! # use provenance_errors::define_errors;
//! define_errors! {
//!     "NET" as NET_ERRORS => {
//!         lowercase_code = ("nope", true),
//!     }
//! }
//! ```

/// Build an [`ErrorContext`](crate::ErrorContext) from `key => value` pairs.
///
/// Values are anything convertible into `serde_json::Value`.
///
/// ```rust
/// # use provenance_errors::context;
/// let ctx = context! { "file" => "a.txt", "attempt" => 3, "cached" => false };
/// assert_eq!(ctx.len(), 3);
/// assert_eq!(context! {}.len(), 0);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::ErrorContext::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut context = $crate::ErrorContext::new();
        $(
            context.insert($key, $value);
        )+
        context
    }};
}

/// Declare one `const` [`ErrorDefinition`](crate::ErrorDefinition).
///
/// ```rust
/// # use provenance_errors::define_error;
/// define_error!(DISK_FULL, "IO", "Disk {device} is full", false, ["device"]);
/// assert_eq!(DISK_FULL.code, "DISK_FULL");
/// ```
#[macro_export]
macro_rules! define_error {
    ($(#[$attr:meta])* $name:ident, $subsystem:expr, $message:expr, $recoverable:expr
        $(, [$($key:literal),* $(,)?])? $(, docs = $docs:literal)?) => {
        $(#[$attr])*
        pub const $name: $crate::ErrorDefinition = {
            const KEYS: &[::std::borrow::Cow<'static, str>] =
                &[$($(::std::borrow::Cow::Borrowed($key)),*)?];
            const _: () = assert!(
                $crate::codes::is_valid_code(stringify!($name)),
                concat!("invalid error code: ", stringify!($name))
            );
            $crate::ErrorDefinition::const_new(
                $subsystem,
                stringify!($name),
                $message,
                $recoverable,
                KEYS,
                $crate::__docs!($($docs)?),
            )
        };
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __docs {
    () => {
        None
    };
    ($docs:literal) => {
        Some($docs)
    };
}

/// Declare a subsystem's definitions and a table listing them.
///
/// Each entry is `NAME = (message, recoverable [, [keys...]] [, docs = "..."])`.
/// The table is a `&[ErrorDefinition]` in declaration order.
#[macro_export]
macro_rules! define_errors {
    ($subsystem:literal as $table:ident => {
        $( $(#[$attr:meta])* $name:ident = ($message:expr, $recoverable:expr
            $(, [$($key:literal),* $(,)?])? $(, docs = $docs:literal)?) ),+ $(,)?
    }) => {
        $(
            $crate::define_error!(
                $(#[$attr])* $name, $subsystem, $message, $recoverable
                $(, [$($key),*])? $(, docs = $docs)?
            );
        )+

        #[doc = concat!("Every `", $subsystem, "` definition, in declaration order.")]
        pub const $table: &[$crate::ErrorDefinition] = &[$($name),+];
    };
}

/// Panic unless a chain matches the expected levels.
///
/// ```rust
/// # use provenance_errors::{assert_chain, create_error, ErrorContext, ErrorDefinition, ExpectedLevel};
/// let err = create_error(&ErrorDefinition::new("A", "outer"), ErrorContext::new(), None);
/// assert_chain!(err, [ExpectedLevel::code("A").with_message("OUT")]);
/// ```
#[macro_export]
macro_rules! assert_chain {
    ($error:expr, [$($level:expr),* $(,)?]) => {
        if let Err(mismatch) = $crate::check_chain(&$error, &[$($level),*]) {
            panic!("cause chain mismatch: {}", mismatch);
        }
    };
}
