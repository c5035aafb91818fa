//! Structured errors as JSON log events, with an in-memory copy for inspection.
//!
//! Run with `RUST_LOG=warn cargo run --example json_logging`.

use provenance_errors::{
    Cause, ErrorFactory, MemorySink, RecordSink, TracingSink, context, definitions,
};
use tracing_subscriber::EnvFilter;

/// Sends each error to every wrapped sink.
struct Tee<'a>(&'a [&'a dyn RecordSink]);

impl RecordSink for Tee<'_> {
    fn record(&self, error: &provenance_errors::StructuredError) {
        for sink in self.0 {
            sink.record(error);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_current_span(false)
        .init();

    // PROVENANCE_ENV=production makes the factory lenient
    let factory = ErrorFactory::from_env_lossy();
    let memory = MemorySink::new(16);
    let sinks: [&dyn RecordSink; 2] = [&TracingSink, &memory];
    let sink = Tee(&sinks);

    sink.record(&factory.create_error(
        &definitions::TIMEOUT,
        context! { "operation" => "sync_inventory", "timeout_ms" => 3000 },
        None,
    ));
    sink.record(&factory.create_error(
        &definitions::CONFIGURATION_INVALID,
        context! { "reason" => "missing [database] section" },
        Some(Cause::foreign(std::io::Error::other("config.toml: unexpected EOF"))),
    ));
    // Missing required key; degrades to UNEXPECTED in strict mode
    sink.record(&factory.create_error(&definitions::INVALID_ARGUMENT, context! {}, None));

    println!("\n--- in memory ({} records) ---", memory.len());
    for record in memory.records() {
        println!("{record}");
    }
    if let Some(record) = memory.find("CONFIGURATION_INVALID") {
        println!("\nroot cause: {}", record["original"]["message"]);
    }
}
