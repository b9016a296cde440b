//! Cooperative executor driven by the caller's own thread.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::debug;

use crate::queue::{BlockingQueue, BoundedQueue, UnboundedQueue};

use super::agent::{agent_loop, request_stop};
use super::executor::{ExecutionMode, ExecutorCounters, ExecutorStats, TaskExecutor};
use super::task::Task;
use super::tracker::CompletionTracker;

/// An executor with zero dedicated agents.
///
/// Queue, completion, and shutdown semantics are identical to
/// [`ThreadPool`](super::ThreadPool), but no threads are spawned: the caller
/// must invoke [`run`], which performs the pop/execute/decrement loop on the
/// calling thread until one poison sentinel is consumed. This pins a stage's
/// work to a specific thread (a rendering context, a GUI event loop, a
/// CUDA-bound thread) without any caller-written synchronization.
///
/// `run` blocks exactly like a pool worker does: until the completion count
/// reaches zero (which issues the sentinel) or [`stop_all`] is called from
/// another thread.
///
/// [`run`]: InlineExecutor::run
/// [`stop_all`]: InlineExecutor::stop_all
///
/// # Examples
///
/// ```
/// use conveyor::core::{InlineExecutor, Task};
/// use std::sync::Arc;
/// use std::thread;
///
/// let exec = Arc::new(InlineExecutor::new());
/// exec.set_task_count(3);
///
/// let producer = {
///     let exec = Arc::clone(&exec);
///     thread::spawn(move || {
///         for i in 0..3 {
///             exec.submit(Task::new(move || println!("task {i}")));
///         }
///     })
/// };
///
/// exec.run(); // caller's thread executes all three tasks
/// producer.join().unwrap();
/// ```
pub struct InlineExecutor<Q: BlockingQueue<Task> + 'static = BoundedQueue<Task>> {
    queue: Arc<Q>,
    tracker: Arc<CompletionTracker>,
    counters: Arc<ExecutorCounters>,
    stopping: Arc<AtomicBool>,
}

impl InlineExecutor<BoundedQueue<Task>> {
    /// Creates a cooperative executor over a bounded queue with the default
    /// capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_queue(BoundedQueue::default())
    }

    /// Changes the bounded queue's blocking threshold.
    ///
    /// Intended to be called right after construction, before tasks are
    /// submitted.
    pub fn set_queue_capacity(&self, capacity: usize) {
        self.queue.set_capacity(capacity);
    }
}

impl Default for InlineExecutor<BoundedQueue<Task>> {
    fn default() -> Self {
        Self::new()
    }
}

impl InlineExecutor<UnboundedQueue<Task>> {
    /// Creates a cooperative executor over an unbounded queue.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_queue(UnboundedQueue::new())
    }
}

impl<Q: BlockingQueue<Task> + 'static> InlineExecutor<Q> {
    /// Creates a cooperative executor draining the given queue.
    pub fn with_queue(queue: Q) -> Self {
        Self {
            queue: Arc::new(queue),
            tracker: Arc::new(CompletionTracker::new()),
            counters: Arc::new(ExecutorCounters::default()),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the number of completions after which [`run`] returns.
    ///
    /// Must be called with the true total before the corresponding tasks are
    /// submitted.
    ///
    /// [`run`]: InlineExecutor::run
    pub fn set_task_count(&self, count: usize) {
        self.tracker.set_expected(count);
    }

    /// Enqueues a task, blocking under backpressure when the queue is full.
    pub fn submit(&self, task: Task) {
        if !task.is_poison() {
            self.counters
                .submitted_tasks
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        self.queue.push(task);
    }

    /// Executes queued tasks on the calling thread until one poison sentinel
    /// is consumed.
    ///
    /// The same precondition as a pool's `wait` applies: the task count must
    /// be set to the true total before tasks are pushed, or the loop can shut
    /// down early.
    pub fn run(&self) {
        debug!("inline agent started");
        agent_loop(
            "inline",
            &*self.queue,
            &self.tracker,
            &self.counters,
            &self.stopping,
            1,
        );
        debug!("inline agent exiting");
    }

    /// Initiates shutdown: idempotently flips the stop flag and pushes a
    /// single poison sentinel for the one cooperative agent. Runs
    /// automatically when the completion count reaches zero; exposed for
    /// explicit early termination.
    pub fn stop_all(&self) {
        request_stop(&*self.queue, &self.stopping, 1);
    }

    /// Snapshot of this executor's counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.counters.snapshot(0, self.tracker.remaining())
    }
}

impl<Q: BlockingQueue<Task> + 'static> TaskExecutor for InlineExecutor<Q> {
    fn set_task_count(&self, count: usize) {
        Self::set_task_count(self, count);
    }

    fn submit(&self, task: Task) {
        Self::submit(self, task);
    }

    fn block_until_done(&self) {
        self.run();
    }

    fn stop_all(&self) {
        Self::stop_all(self);
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Inline
    }

    fn stats(&self) -> ExecutorStats {
        Self::stats(self)
    }
}
