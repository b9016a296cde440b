//! Pipeline stages: an executor bound to a transform and an optional
//! successor.
//!
//! A [`Stage`] is the unit of pipeline composition. Pushing a token into a
//! stage enqueues a task that applies the stage's transform and then forwards
//! the token to the successor stage, if one is chained. Forwarding happens
//! synchronously inside the executed task: when the successor's queue is full
//! the forwarding push blocks, occupying the current stage's worker and
//! thereby transmitting backpressure upstream, hop by hop.
//!
//! Stages are handled through `Arc` so a chain and its owner share the stages
//! safely; the owning collection (typically a
//! [`Pipeline`](crate::stage::Pipeline)) governs their lifetime.

mod pipeline;

pub use pipeline::{Pipeline, PipelineBuilder};

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use crate::config::StageConfig;
use crate::core::agent::panic_message;
use crate::core::{
    ExecutionMode, ExecutorStats, InlineExecutor, StageError, Task, TaskExecutor, ThreadPool,
};

/// One pipeline step: a named executor bound to a transform callback and an
/// optional successor.
///
/// The token type `T` is an opaque identifier correlating a unit of work with
/// externally owned state (typically an index into a shared array). The stage
/// never copies or owns payload data; it only moves tokens between queues.
///
/// # Ordering
///
/// Tokens flow strictly serially from stage to stage: no two stages process
/// the same token concurrently. Within one stage, multiple workers may
/// process *different* tokens concurrently, so tokens can complete and
/// forward out of their original order. That is a property of multi-worker
/// stages, not a bug; use a single worker where cross-token order matters.
///
/// # Failure policy
///
/// A panicking transform is captured, logged, and counted in
/// [`failures`](Stage::failures), and the token is still forwarded to the
/// successor. Every stage's completion count therefore keeps decrementing no
/// matter which transforms fail, and `wait`/`run` can never hang on a bad
/// token anywhere in the chain.
///
/// # Examples
///
/// ```
/// use conveyor::stage::{chain, Stage};
/// use std::sync::atomic::{AtomicI64, Ordering};
/// use std::sync::Arc;
///
/// let data: Arc<Vec<AtomicI64>> = Arc::new((0..10).map(AtomicI64::new).collect());
///
/// let d = Arc::clone(&data);
/// let double = Stage::pool("double", 2, 8, move |i: usize| {
///     // Per-token slots are touched by one stage at a time, so a plain
///     // read-modify-write is safe here.
///     let v = d[i].load(Ordering::SeqCst);
///     d[i].store(v * 2, Ordering::SeqCst);
/// });
/// let d = Arc::clone(&data);
/// let add_one = Stage::pool("add-one", 2, 8, move |i: usize| {
///     d[i].fetch_add(1, Ordering::SeqCst);
/// });
///
/// chain(&double, &add_one);
/// double.set_task_count(10);
/// add_one.set_task_count(10);
///
/// for i in 0..10 {
///     double.push(i);
/// }
/// add_one.wait();
///
/// for i in 0..10 {
///     assert_eq!(data[i].load(Ordering::SeqCst), i as i64 * 2 + 1);
/// }
/// ```
pub struct Stage<T: Clone + Send + 'static> {
    name: String,
    executor: Box<dyn TaskExecutor>,
    transform: Arc<dyn Fn(T) + Send + Sync + 'static>,
    next: Mutex<Option<Arc<Stage<T>>>>,
    failures: AtomicU64,
}

impl<T: Clone + Send + 'static> Stage<T> {
    /// Creates a stage backed by a worker-thread pool with `workers` threads
    /// and a bounded queue of `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `workers` or `capacity` is zero; use
    /// [`from_config`](Stage::from_config) for fallible construction.
    pub fn pool(
        name: impl Into<String>,
        workers: usize,
        capacity: usize,
        transform: impl Fn(T) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let executor = ThreadPool::new(workers);
        executor.set_queue_capacity(capacity);
        Self::with_executor(name, Box::new(executor), transform)
    }

    /// Creates a stage with no dedicated workers and a bounded queue of
    /// `capacity`. The caller drives it by invoking [`run`](Stage::run) on
    /// whichever thread the work must execute on (a render thread, a GUI
    /// event loop).
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; use [`from_config`](Stage::from_config)
    /// for fallible construction.
    pub fn inline(
        name: impl Into<String>,
        capacity: usize,
        transform: impl Fn(T) + Send + Sync + 'static,
    ) -> Arc<Self> {
        let executor = InlineExecutor::new();
        executor.set_queue_capacity(capacity);
        Self::with_executor(name, Box::new(executor), transform)
    }

    /// Creates a stage from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StageError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn from_config(
        config: &StageConfig,
        transform: impl Fn(T) + Send + Sync + 'static,
    ) -> Result<Arc<Self>, StageError> {
        config.validate().map_err(StageError::InvalidConfig)?;
        Ok(match config.mode {
            ExecutionMode::Pool => {
                Self::pool(&config.name, config.workers, config.capacity, transform)
            }
            ExecutionMode::Inline => Self::inline(&config.name, config.capacity, transform),
        })
    }

    /// Creates a stage around an existing executor.
    pub fn with_executor(
        name: impl Into<String>,
        executor: Box<dyn TaskExecutor>,
        transform: impl Fn(T) + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            executor,
            transform: Arc::new(transform),
            next: Mutex::new(None),
            failures: AtomicU64::new(0),
        })
    }

    /// The stage's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Which execution strategy backs this stage.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.executor.mode()
    }

    /// Sets this stage's expected completions. Each stage tracks its own
    /// count independently: a chain of K stages needs the count set on every
    /// stage before tokens start flowing.
    pub fn set_task_count(&self, count: usize) {
        self.executor.set_task_count(count);
    }

    /// Establishes the forwarding link to the successor stage.
    ///
    /// Must be called before any `push` whose token should be forwarded.
    /// The successor graph must stay acyclic: a cycle forwards tokens
    /// forever. Changing the link while tasks are in flight is unsupported.
    pub fn set_next(&self, next: &Arc<Self>) {
        *self.next.lock() = Some(Arc::clone(next));
    }

    /// Enqueues a token: the stage's executor will apply the transform and
    /// forward the token to the successor, if one is set.
    ///
    /// Blocks under backpressure when this stage's queue is full.
    pub fn push(self: &Arc<Self>, token: T) {
        let stage = Arc::clone(self);
        self.executor.submit(Task::new(move || stage.process(token)));
    }

    /// Blocks the calling thread until this stage's completion count reaches
    /// zero. Intended for pool-backed stages; on an inline stage this call
    /// would drive the work on the current thread (prefer [`run`] there for
    /// clarity).
    ///
    /// Precondition: [`set_task_count`] was given the true total before the
    /// corresponding tokens were pushed.
    ///
    /// [`run`]: Stage::run
    /// [`set_task_count`]: Stage::set_task_count
    pub fn wait(&self) {
        self.executor.block_until_done();
    }

    /// Executes this stage's tasks on the calling thread until the completion
    /// count reaches zero. This is how inline-backed stages make progress;
    /// the same precondition as [`wait`](Stage::wait) applies.
    pub fn run(&self) {
        self.executor.block_until_done();
    }

    /// Initiates early shutdown of this stage's executor. Tokens already
    /// queued behind the sentinels are discarded unexecuted.
    pub fn stop_all(&self) {
        self.executor.stop_all();
    }

    /// Snapshot of the backing executor's counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.executor.stats()
    }

    /// Number of transform invocations that panicked on this stage.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn process(self: &Arc<Self>, token: T) {
        let transform = &*self.transform;
        let arg = token.clone();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || transform(arg))) {
            self.failures.fetch_add(1, Ordering::Relaxed);
            error!(
                stage = %self.name,
                "transform panicked, forwarding token anyway: {}",
                panic_message(&payload)
            );
        }
        let next = self.next.lock().clone();
        if let Some(next) = next {
            next.push(token);
        }
    }
}

/// Links two stages so that tokens processed by `upstream` are forwarded to
/// `downstream`, regardless of the executor strategies backing either side.
pub fn chain<T: Clone + Send + 'static>(upstream: &Arc<Stage<T>>, downstream: &Arc<Stage<T>>) {
    upstream.set_next(downstream);
}
