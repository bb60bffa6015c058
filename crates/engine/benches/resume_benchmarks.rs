//! Capture and Resume Benchmarks
//!
//! Measures the cost of the engine's two driver-facing operations:
//! - invoke: initial activation ending in a capture
//! - resume: re-entry of one snapshot, on both branches of CounterReplay

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reprise_core::{FunctionId, Value};
use reprise_engine::routines::counter_replay::{COUNTER_REPLAY, DEFAULT_COUNTER};
use reprise_engine::{CounterReplay, ResumeEngine};
use reprise_storage::SharedStore;
use std::sync::Arc;

fn engine() -> ResumeEngine {
    let engine = ResumeEngine::new(SharedStore::new());
    engine.register(Arc::new(CounterReplay::new())).unwrap();
    engine
}

/// Benchmark: initial activation that captures
fn bench_invoke(c: &mut Criterion) {
    let engine = engine();
    let id = FunctionId::from(COUNTER_REPLAY);

    let mut group = c.benchmark_group("invoke");
    group.throughput(Throughput::Elements(1));
    group.bench_function("capture", |b| {
        b.iter(|| {
            engine.store().set(DEFAULT_COUNTER, Value::Int(0));
            black_box(engine.invoke(&id, Some(Value::Int(13))).unwrap());
        });
    });
    group.finish();
}

/// Benchmark: resume of one snapshot on each branch
fn bench_resume(c: &mut Criterion) {
    let engine = engine();
    let snap = engine
        .invoke(&FunctionId::from(COUNTER_REPLAY), Some(Value::Int(13)))
        .unwrap()
        .into_snapshot()
        .unwrap();

    let mut group = c.benchmark_group("resume");
    group.throughput(Throughput::Elements(1));

    group.bench_function("terminal_value", |b| {
        engine.store().set(DEFAULT_COUNTER, Value::Int(2));
        b.iter(|| black_box(engine.resume(&snap, None).unwrap()));
    });

    group.bench_function("nested_capture", |b| {
        b.iter(|| {
            engine.store().set(DEFAULT_COUNTER, Value::Int(1));
            black_box(engine.resume(&snap, None).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_invoke, bench_resume);
criterion_main!(benches);
