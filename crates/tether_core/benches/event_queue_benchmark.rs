//! # Event Queue Benchmark
//!
//! The UI thread must never stall on the queue. This benchmark measures:
//! 1. Push + drain of a typical per-frame batch
//! 2. Coalescing a resize storm (window drag on desktop hosts)
//!
//! Target: a 64-event frame batch in well under a microsecond per event.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tether_core::{coalesce_resizes, Event, EventQueue, SurfaceSize, TouchInput, TouchPhase};

fn touch(i: i32) -> Event {
    Event::Touch(TouchInput {
        pointer_id: i,
        phase: TouchPhase::Moved,
        x: i as f32,
        y: i as f32,
    })
}

/// Benchmark a producer filling one frame's worth of events, then one drain.
fn bench_push_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_push_drain");

    for batch in [16, 64, 256] {
        let queue = EventQueue::new();
        group.throughput(criterion::Throughput::Elements(batch as u64));

        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &batch| {
            b.iter(|| {
                for i in 0..batch {
                    queue.push(touch(i));
                }
                black_box(queue.drain_all());
            });
        });
    }

    group.finish();
}

/// Benchmark coalescing a drag-resize storm interleaved with touches.
fn bench_coalesce(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_queue_coalesce");

    for resizes in [8u32, 64, 512] {
        group.bench_with_input(
            BenchmarkId::new("resizes", resizes),
            &resizes,
            |b, &resizes| {
                b.iter_batched(
                    || {
                        let mut events = Vec::with_capacity(resizes as usize * 2);
                        for i in 0..resizes {
                            events.push(Event::SurfaceChanged(SurfaceSize::new(i, i)));
                            events.push(touch(i as i32));
                        }
                        events
                    },
                    |events| black_box(coalesce_resizes(events)),
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_push_drain, bench_coalesce);
criterion_main!(benches);
