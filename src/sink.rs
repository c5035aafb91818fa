//! Destinations for error records.
//!
//! The core never logs by itself. Code that reports errors takes a
//! [`RecordSink`] and hands each error to it; production wiring passes
//! [`TracingSink`], tests pass a [`MemorySink`] and inspect what arrived.
//!
//! ```rust
//! use provenance_errors::{context, create_error, definitions, MemorySink, RecordSink};
//!
//! fn sync(sink: &dyn RecordSink) {
//!     let err = create_error(
//!         &definitions::TIMEOUT,
//!         context! { "operation" => "sync", "timeout_ms" => 500 },
//!         None,
//!     );
//!     sink.record(&err);
//! }
//!
//! let sink = MemorySink::new(8);
//! sync(&sink);
//! assert_eq!(sink.codes(), ["TIMEOUT"]);
//! assert_eq!(sink.records()[0]["context"]["timeout_ms"], 500);
//! ```

use crate::StructuredError;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Something that accepts finished errors.
pub trait RecordSink: Send + Sync {
    /// Take one error.
    fn record(&self, error: &StructuredError);
}

impl<S: RecordSink + ?Sized> RecordSink for &S {
    fn record(&self, error: &StructuredError) {
        (**self).record(error)
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Arc<S> {
    fn record(&self, error: &StructuredError) {
        (**self).record(error)
    }
}

/// Forwards every error to [`StructuredError::emit`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RecordSink for TracingSink {
    fn record(&self, error: &StructuredError) {
        error.emit();
    }
}

/// Keeps the JSON records of the most recent errors in memory.
///
/// Records are stored without stack traces, so each one stays small and
/// compares equal across runs. Once `capacity` records are held, each new
/// one drops the oldest. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemorySink {
    state: Arc<Mutex<Retained>>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Retained {
    records: VecDeque<Value>,
    dropped: u64,
}

impl MemorySink {
    /// Sink holding at most `capacity` records (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(Retained {
                records: VecDeque::with_capacity(capacity),
                dropped: 0,
            })),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Retained> {
        // Records are plain values; a panic elsewhere cannot leave them torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All held records, oldest first.
    pub fn records(&self) -> Vec<Value> {
        self.lock().records.iter().cloned().collect()
    }

    /// Up to `count` records, newest first.
    pub fn recent(&self, count: usize) -> Vec<Value> {
        self.lock().records.iter().rev().take(count).cloned().collect()
    }

    /// Top-level codes of the held records, oldest first.
    pub fn codes(&self) -> Vec<String> {
        self.lock()
            .records
            .iter()
            .map(|record| record["code"].as_str().unwrap_or_default().to_owned())
            .collect()
    }

    /// Most recent record whose chain contains `code` at any level.
    pub fn find(&self, code: &str) -> Option<Value> {
        self.lock()
            .records
            .iter()
            .rev()
            .find(|record| chain_has_code(record, code))
            .cloned()
    }

    /// Number of held records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether nothing has been recorded since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Maximum number of held records.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records pushed out by newer ones since creation.
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    /// Forget every held record. The drop counter is kept.
    pub fn clear(&self) {
        self.lock().records.clear();
    }
}

impl RecordSink for MemorySink {
    fn record(&self, error: &StructuredError) {
        let record = error.record().without_stack().to_value();
        let mut state = self.lock();
        if state.records.len() == self.capacity {
            state.records.pop_front();
            state.dropped += 1;
        }
        state.records.push_back(record);
    }
}

fn chain_has_code(record: &Value, code: &str) -> bool {
    let mut level = Some(record);
    while let Some(current) = level {
        if current["code"] == code {
            return true;
        }
        level = current.get("original").filter(|next| !next.is_null());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cause, ErrorContext, ErrorDefinition, FactoryConfig, context};
    use std::thread;

    fn error(code: &'static str, original: Option<Cause>) -> StructuredError {
        StructuredError::new(
            &ErrorDefinition::new(code, "failed"),
            ErrorContext::new(),
            original,
            &FactoryConfig::new(true),
        )
        .unwrap()
    }

    #[test]
    fn oldest_records_are_dropped_first() {
        let sink = MemorySink::new(2);
        for code in ["FIRST", "SECOND", "THIRD"] {
            sink.record(&error(code, None));
        }

        assert_eq!(sink.codes(), ["SECOND", "THIRD"]);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(sink.recent(1)[0]["code"], "THIRD");
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let sink = MemorySink::new(0);
        assert_eq!(sink.capacity(), 1);
        sink.record(&error("ONLY", None));
        sink.record(&error("LATEST", None));
        assert_eq!(sink.codes(), ["LATEST"]);
    }

    #[test]
    fn records_are_complete_json_without_stacks() {
        let inner = error("INNER", Some(Cause::foreign(std::io::Error::other("disk"))));
        #[cfg(feature = "stack-capture")]
        assert!(inner.stack().is_some());
        let outer = error("OUTER", Some(inner.into()));

        let sink = MemorySink::new(4);
        sink.record(&outer);
        let records = sink.records();
        let record = &records[0];

        assert!(record["stack"].is_null());
        assert!(record["original"]["stack"].is_null());
        assert_eq!(record["original"]["original"]["message"], "disk");

        let text = record.to_string();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), *record);
    }

    #[test]
    fn find_searches_nested_causes() {
        let sink = MemorySink::new(4);
        let root = error("ROOT", None);
        sink.record(&error("TOP", Some(root.into())));
        sink.record(&error("OTHER", None));

        assert_eq!(sink.find("ROOT").unwrap()["code"], "TOP");
        assert!(sink.find("MISSING").is_none());
    }

    #[test]
    fn clear_keeps_drop_count() {
        let sink = MemorySink::new(1);
        sink.record(&error("A", None));
        sink.record(&error("B", None));
        sink.clear();
        assert!(sink.is_empty());
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn clones_share_storage_across_threads() {
        let sink = MemorySink::new(64);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for _ in 0..8 {
                        sink.record(&error("THREADED", None));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.len(), 32);
    }

    #[test]
    fn reporting_code_can_take_any_sink() {
        fn report(sink: &dyn RecordSink, user: &str) {
            let def = ErrorDefinition::new("LOGIN_FAILED", "Login for {user} failed");
            sink.record(&crate::create_error(&def, context! { "user" => user }, None));
        }

        let sink = Arc::new(MemorySink::new(4));
        report(&sink, "ada");
        report(&TracingSink, "ada");
        assert_eq!(sink.records()[0]["message"], "Login for ada failed");
    }
}
