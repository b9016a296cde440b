//! # Conveyor
//!
//! Composable concurrent pipeline stages with bounded queues, backpressure,
//! and mixed thread-pool/inline execution.
//!
//! Conveyor is a single-process, in-memory scheduling primitive: blocking
//! FIFO queues feed interchangeable execution strategies, and a [`Stage`]
//! abstraction chains those executors into a multi-stage pipeline that
//! forwards opaque work tokens with backpressure preserved end to end.
//!
//! ## Core Problem Solved
//!
//! Multi-stage processing pipelines routinely mix two kinds of work:
//!
//! - **Parallel stages**: CPU-bound transforms that scale across a pool of
//!   worker threads
//! - **Thread-pinned stages**: work that must run on one specific thread,
//!   such as a rendering surface, a GUI event loop, or a CUDA context
//!
//! Wiring these together by hand means hand-rolling producer/consumer
//! synchronization, per-stage completion tracking, and a shutdown protocol
//! that cannot deadlock under backpressure. Conveyor packages those pieces so
//! the caller writes only the per-token transforms.
//!
//! ## Key Features
//!
//! - **Blocking queue primitives**: unbounded and capacity-bounded FIFO
//!   queues built on `parking_lot`; waiting threads park, never spin
//! - **Backpressure**: a bounded queue's blocking push throttles a fast
//!   upstream stage to the pace of a slow downstream one, transitively
//! - **Two executor strategies behind one trait**: dedicated worker-thread
//!   pools and an inline executor driven by the caller's own thread
//! - **Poison-pill shutdown**: one sentinel per agent, pushed with the same
//!   blocking contract as real work, so every worker exits deterministically
//!   after real work drains
//! - **Completion tracking**: per-stage counters with a blocking `wait`, and
//!   automatic shutdown on count exhaustion
//! - **Panic isolation**: a panicking transform is captured, counted, and
//!   logged; the token still flows downstream and waiters never hang
//!
//! ## A Two-Stage Pipeline
//!
//! ```
//! use conveyor::stage::{chain, Stage};
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! // External state, indexed by token. Stages hand tokens off serially, so
//! // per-token slots are never touched by two stages at once.
//! let data: Arc<Vec<AtomicI64>> = Arc::new((0..10).map(AtomicI64::new).collect());
//!
//! let d = Arc::clone(&data);
//! let double = Stage::pool("double", 2, 8, move |i: usize| {
//!     let v = d[i].load(Ordering::SeqCst);
//!     d[i].store(v * 2, Ordering::SeqCst);
//! });
//!
//! let d = Arc::clone(&data);
//! let add_one = Stage::pool("add-one", 2, 8, move |i: usize| {
//!     d[i].fetch_add(1, Ordering::SeqCst);
//! });
//!
//! chain(&double, &add_one);
//! double.set_task_count(10);
//! add_one.set_task_count(10);
//!
//! for i in 0..10 {
//!     double.push(i);
//! }
//! add_one.wait();
//!
//! assert!((0..10).all(|i| data[i].load(Ordering::SeqCst) == i as i64 * 2 + 1));
//! ```
//!
//! ## Pinning a Stage to the Calling Thread
//!
//! An inline stage has no workers of its own; whoever calls
//! [`Stage::run`] becomes its execution agent. This is how a pipeline
//! forwards work onto a thread it does not control scheduling for:
//!
//! ```
//! use conveyor::stage::{chain, Stage};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let process = Stage::pool("process", 2, 4, |_i: usize| { /* CPU work */ });
//! let render = Stage::inline("render", 8, |i: usize| {
//!     println!("rendering {i} on the main thread");
//! });
//!
//! chain(&process, &render);
//! process.set_task_count(10);
//! render.set_task_count(10);
//!
//! let producer = {
//!     let process = Arc::clone(&process);
//!     thread::spawn(move || {
//!         for i in 0..10 {
//!             process.push(i);
//!         }
//!     })
//! };
//!
//! render.run(); // blocks; tokens are rendered here as they arrive
//! process.wait();
//! producer.join().unwrap();
//! ```
//!
//! For complete examples, see the integration tests under `tests/`.

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Execution primitives: tasks, completion tracking, and executors.
pub mod core;
/// Configuration models for stages and pipelines.
pub mod config;
/// Blocking FIFO queue primitives.
pub mod queue;
/// Pipeline stages and chaining.
pub mod stage;
/// Shared utilities.
pub mod util;

pub use crate::core::{
    AppResult, CompletionTracker, ExecutionMode, ExecutorStats, InlineExecutor, StageError, Task,
    TaskExecutor, ThreadPool,
};
pub use crate::stage::{chain, Pipeline, PipelineBuilder, Stage};
