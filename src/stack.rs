//! Call-site stack traces for structured errors.
//!
//! Capture is cheap: only instruction pointers are recorded when the error
//! is built. Symbol resolution happens once, the first time the trace is
//! rendered (by `to_json()`, `record()` or [`StackTrace::rendered`]).
//!
//! Frames belonging to the capture machinery, the factory and
//! `StructuredError`'s own constructors are elided, so the first rendered
//! frame is the code that asked for the error.
//!
//! Without the `stack-capture` feature, or with capture disabled in
//! [`FactoryConfig`](crate::FactoryConfig), traces are empty and render as
//! `None`.

#[cfg(feature = "stack-capture")]
use std::sync::{Arc, OnceLock};

/// Frames whose symbol starts with one of these are skipped at the top of the trace.
#[cfg(feature = "stack-capture")]
const ELIDED_PREFIXES: &[&str] = &[
    "backtrace::",
    "<backtrace::",
    "provenance_errors::stack::",
    "<provenance_errors::stack::",
    "provenance_errors::factory::",
    "<provenance_errors::factory::",
    "provenance_errors::StructuredError::",
    "<provenance_errors::StructuredError>::",
];

/// A captured, lazily rendered stack trace.
#[derive(Clone, Default)]
pub struct StackTrace {
    #[cfg(feature = "stack-capture")]
    inner: Option<Arc<Captured>>,
}

#[cfg(feature = "stack-capture")]
struct Captured {
    raw: backtrace::Backtrace,
    rendered: OnceLock<String>,
}

impl StackTrace {
    /// Capture the current stack.
    #[inline(never)]
    pub fn capture() -> Self {
        #[cfg(feature = "stack-capture")]
        {
            Self {
                inner: Some(Arc::new(Captured {
                    raw: backtrace::Backtrace::new_unresolved(),
                    rendered: OnceLock::new(),
                })),
            }
        }

        #[cfg(not(feature = "stack-capture"))]
        {
            Self::empty()
        }
    }

    /// Capture the current stack when `capture` is set, else an empty trace.
    #[inline(never)]
    pub fn capture_if(capture: bool) -> Self {
        if capture { Self::capture() } else { Self::empty() }
    }

    /// A trace with no frames.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a trace was captured.
    #[inline]
    pub fn is_captured(&self) -> bool {
        #[cfg(feature = "stack-capture")]
        {
            self.inner.is_some()
        }

        #[cfg(not(feature = "stack-capture"))]
        {
            false
        }
    }

    /// Rendered trace, one `    at symbol (file:line)` line per frame.
    pub fn rendered(&self) -> Option<&str> {
        #[cfg(feature = "stack-capture")]
        {
            let captured = self.inner.as_ref()?;
            Some(
                captured
                    .rendered
                    .get_or_init(|| render_frames(&captured.raw))
                    .as_str(),
            )
        }

        #[cfg(not(feature = "stack-capture"))]
        {
            None
        }
    }
}

#[cfg(feature = "stack-capture")]
fn render_frames(raw: &backtrace::Backtrace) -> String {
    use std::fmt::Write;

    let mut trace = raw.clone();
    trace.resolve();

    let mut out = String::new();
    let mut skipping = true;

    for frame in trace.frames() {
        let symbols = frame.symbols();

        if skipping {
            let elided = symbols.iter().any(|symbol| {
                symbol.name().is_some_and(|name| {
                    let name = format!("{:#}", name);
                    ELIDED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
                })
            });
            if elided {
                continue;
            }
            skipping = false;
        }

        if symbols.is_empty() {
            let _ = writeln!(out, "    at <unknown> ({:?})", frame.ip());
            continue;
        }

        for symbol in symbols {
            let name = symbol
                .name()
                .map_or_else(|| String::from("<unknown>"), |n| format!("{:#}", n));
            match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(line)) => {
                    let _ = writeln!(out, "    at {} ({}:{})", name, file.display(), line);
                }
                _ => {
                    let _ = writeln!(out, "    at {}", name);
                }
            }
        }
    }

    if out.ends_with('\n') {
        out.pop();
    }
    out
}

impl std::fmt::Debug for StackTrace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackTrace")
            .field("captured", &self.is_captured())
            .finish()
    }
}
