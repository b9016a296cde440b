//! Benchmarks for the pipeline primitives.
//!
//! Benchmarks cover:
//! - Queue operations (push/pop on bounded and unbounded queues)
//! - Completion tracking
//! - Thread pool task execution
//! - End-to-end multi-stage pipeline throughput

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use conveyor::queue::{BlockingQueue, BoundedQueue, UnboundedQueue};
use conveyor::stage::{chain, Stage};
use conveyor::{CompletionTracker, Task, ThreadPool};

// ============================================================================
// Queue Benchmarks
// ============================================================================

fn bench_bounded_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounded_push_pop");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = BoundedQueue::new(size as usize);
                for i in 0..size {
                    q.push(i);
                }
                for _ in 0..size {
                    black_box(q.pop());
                }
            });
        });
    }
    group.finish();
}

fn bench_unbounded_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("unbounded_push_pop");

    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = UnboundedQueue::new();
                for i in 0..size {
                    q.push(i);
                }
                for _ in 0..size {
                    black_box(q.pop());
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Completion Tracker Benchmarks
// ============================================================================

fn bench_tracker_complete(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_complete");

    for size in [1_000_u64, 100_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let tracker = CompletionTracker::new();
                tracker.set_expected(size as usize);
                for _ in 0..size {
                    black_box(tracker.complete_one());
                }
                tracker.wait();
            });
        });
    }
    group.finish();
}

// ============================================================================
// Executor Benchmarks
// ============================================================================

fn bench_pool_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_execute");
    group.sample_size(20);

    for workers in [1_usize, 2, 4] {
        group.bench_with_input(
            BenchmarkId::from_parameter(workers),
            &workers,
            |b, &workers| {
                b.iter(|| {
                    let pool = ThreadPool::new(workers);
                    pool.set_queue_capacity(64);
                    pool.set_task_count(1_000);
                    for i in 0..1_000_u64 {
                        pool.submit(Task::new(move || {
                            black_box(i.wrapping_mul(31));
                        }));
                    }
                    pool.wait();
                });
            },
        );
    }
    group.finish();
}

// ============================================================================
// End-to-End Pipeline Benchmarks
// ============================================================================

fn bench_two_stage_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("two_stage_pipeline");
    group.sample_size(20);

    const TOKENS: usize = 500;
    group.throughput(Throughput::Elements(TOKENS as u64));
    group.bench_function("pool_to_pool", |b| {
        b.iter(|| {
            let data: Arc<Vec<AtomicI64>> =
                Arc::new((0..TOKENS as i64).map(AtomicI64::new).collect());

            let d = Arc::clone(&data);
            let first = Stage::pool("first", 2, 32, move |i: usize| {
                let v = d[i].load(Ordering::Relaxed);
                d[i].store(v * 2, Ordering::Relaxed);
            });
            let d = Arc::clone(&data);
            let second = Stage::pool("second", 2, 32, move |i: usize| {
                d[i].fetch_add(1, Ordering::Relaxed);
            });

            chain(&first, &second);
            first.set_task_count(TOKENS);
            second.set_task_count(TOKENS);

            for i in 0..TOKENS {
                first.push(i);
            }
            second.wait();
            first.wait();
            black_box(data[TOKENS - 1].load(Ordering::Relaxed));
        });
    });
    group.finish();
}

criterion_group!(queue_benches, bench_bounded_push_pop, bench_unbounded_push_pop);

criterion_group!(tracker_benches, bench_tracker_complete);

criterion_group!(executor_benches, bench_pool_execute);

criterion_group!(pipeline_benches, bench_two_stage_pipeline);

criterion_main!(queue_benches, tracker_benches, executor_benches, pipeline_benches);
