// benches/error_performance.rs
//! Benchmarks for provenance_errors hot paths
//!
//! Covers templating, factory construction (happy path and both fallbacks),
//! serialization, chain verification and the in-memory sink.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use provenance_errors::{
    Cause, CreateOptions, ErrorContext, ErrorDefinition, ErrorFactory, ExpectedLevel,
    FactoryConfig, MemorySink, RecordSink, StructuredError, check_chain, context, definitions,
    render,
};
use serde_json::json;
use std::io;

const FETCH_FAILED: ErrorDefinition =
    ErrorDefinition::new("FETCH_FAILED", "Fetching {resource} from {host} failed after {attempts} attempts");

fn factory(capture_stack: bool) -> ErrorFactory {
    ErrorFactory::new(FactoryConfig::new(true).with_capture_stack(capture_stack))
}

fn fetch_context() -> ErrorContext {
    context! {
        "resource" => "/v1/users",
        "host" => "api.internal",
        "attempts" => 3,
    }
}

fn nested(depth: usize) -> StructuredError {
    let f = factory(false);
    let mut err = f.create_error(
        &FETCH_FAILED,
        fetch_context(),
        Some(Cause::foreign(io::Error::new(io::ErrorKind::TimedOut, "timed out"))),
    );
    for _ in 1..depth {
        err = f.create_error(&FETCH_FAILED, fetch_context(), Some(err.into()));
    }
    err
}

// ============================================================================
// Templating
// ============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let ctx = fetch_context();

    group.bench_function("no_placeholders", |b| {
        b.iter(|| render(black_box("Connection refused by upstream"), &ctx))
    });
    group.bench_function("three_placeholders", |b| {
        b.iter(|| render(black_box(&*FETCH_FAILED.message), &ctx))
    });
    group.bench_function("unknown_placeholders", |b| {
        b.iter(|| render(black_box("{a} {b} {c} {d} {e}"), &ctx))
    });

    group.finish();
}

// ============================================================================
// Construction
// ============================================================================

fn bench_create_error(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_error");
    let quiet = factory(false);

    group.bench_function("happy_path", |b| {
        b.iter(|| black_box(quiet.create_error(&FETCH_FAILED, fetch_context(), None)))
    });

    group.bench_function("happy_path_with_stack", |b| {
        let loud = factory(true);
        b.iter(|| black_box(loud.create_error(&FETCH_FAILED, fetch_context(), None)))
    });

    group.bench_function("validation_failed", |b| {
        let bad = ErrorDefinition::new("bad code", "");
        b.iter(|| black_box(quiet.create_error(&bad, ErrorContext::new(), None)))
    });

    group.bench_function("missing_keys_unexpected", |b| {
        b.iter(|| black_box(quiet.create_error(&definitions::TIMEOUT, ErrorContext::new(), None)))
    });

    group.bench_function("lenient_untyped", |b| {
        let def = json!({"code": "UNTYPED", "message": "value {v}"});
        b.iter(|| {
            black_box(quiet.create_error_from_value(
                &def,
                context! { "v" => 1 },
                None,
                CreateOptions::lenient(),
            ))
        })
    });

    group.finish();
}

// ============================================================================
// Serialization
// ============================================================================

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    for depth in [1usize, 4, 16] {
        let err = nested(depth);
        group.bench_with_input(BenchmarkId::new("to_json", depth), &err, |b, err| {
            b.iter(|| black_box(err.to_json()))
        });
        group.bench_with_input(BenchmarkId::new("format", depth), &err, |b, err| {
            b.iter(|| black_box(err.format()))
        });
    }

    group.finish();
}

// ============================================================================
// Chain verification
// ============================================================================

fn bench_check_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_chain");

    for depth in [2usize, 8, 32] {
        let err = nested(depth);
        let mut expected = vec![ExpectedLevel::code("FETCH_FAILED").with_message("api.internal"); depth];
        expected.push(ExpectedLevel::type_name("Error").with_message("timed out"));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &(err, expected), |b, (err, expected)| {
            b.iter(|| check_chain(black_box(err), black_box(expected)))
        });
    }

    group.finish();
}

// ============================================================================
// Memory sink
// ============================================================================

fn bench_memory_sink(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_sink");
    let err = nested(3);

    for capacity in [16, 256, 4096] {
        let sink = MemorySink::new(capacity);
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, _| {
            b.iter(|| sink.record(black_box(&err)))
        });
    }

    group.bench_function("concurrent_4_threads", |b| {
        b.iter(|| {
            let sink = MemorySink::new(1000);
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let sink = sink.clone();
                    let err = err.clone();
                    std::thread::spawn(move || {
                        for _ in 0..250 {
                            sink.record(&err);
                        }
                    })
                })
                .collect();
            for handle in handles {
                let _ = handle.join();
            }
            black_box(sink.len())
        })
    });

    group.finish();
}

criterion_group!(templating_benches, bench_render);
criterion_group!(creation_benches, bench_create_error);
criterion_group!(serialization_benches, bench_serialization, bench_check_chain);
criterion_group!(sink_benches, bench_memory_sink);

criterion_main!(
    templating_benches,
    creation_benches,
    serialization_benches,
    sink_benches,
);
