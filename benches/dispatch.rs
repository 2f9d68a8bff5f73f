//! Dispatch benchmark suite.
//!
//! Measures fan-out cost of the emission modes at different listener counts.
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use titanium_link::{EventEmitter, Listener};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 16, 256];

// ============================================================================
// Setup
// ============================================================================

fn emitter_with(count: usize) -> (EventEmitter, Arc<AtomicUsize>) {
    let events = EventEmitter::new();
    let hits = Arc::new(AtomicUsize::new(0));

    for _ in 0..count {
        let hits = Arc::clone(&hits);
        events.subscribe(
            "tick",
            &Listener::new(move |_| {
                hits.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }),
        );
    }

    (events, hits)
}

// ============================================================================
// Benchmark: emit_sync
// ============================================================================

fn bench_emit_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_sync");

    for &count in LISTENER_COUNTS {
        let (events, hits) = emitter_with(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                events.emit_sync("tick", black_box(vec![json!(1)]));
            });
        });
        black_box(hits.load(Ordering::Relaxed));
    }

    group.finish();
}

// ============================================================================
// Benchmark: emit
// ============================================================================

fn bench_emit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("emit");

    for &count in LISTENER_COUNTS {
        let (events, _) = emitter_with(count);
        let events = &events;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.to_async(&rt)
                .iter(move || async move { events.emit("tick", black_box(vec![json!(1)])).await });
        });
    }

    group.finish();
}

// ============================================================================
// Main
// ============================================================================

criterion_group!(benches, bench_emit_sync, bench_emit);
criterion_main!(benches);
