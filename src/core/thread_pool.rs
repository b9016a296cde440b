//! Worker-pool executor backed by dedicated OS threads.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::queue::{BlockingQueue, BoundedQueue, UnboundedQueue};

use super::agent::{agent_loop, request_stop};
use super::executor::{ExecutionMode, ExecutorCounters, ExecutorStats, TaskExecutor};
use super::task::Task;
use super::tracker::CompletionTracker;

/// An executor that runs tasks on a fixed set of persistent worker threads.
///
/// Construction spawns exactly `worker_count` threads up front. Each worker
/// loops: dequeue a task, execute it, decrement the completion tracker. When
/// the tracker hits zero the observing worker initiates shutdown by pushing
/// one poison sentinel per worker, guaranteeing every thread eventually
/// dequeues a sentinel and exits, even under backpressure, because sentinels
/// use the same blocking push as real work.
///
/// The pool is generic over its queue. The default is a [`BoundedQueue`],
/// which gives producers backpressure; [`ThreadPool::unbounded`] trades that
/// away for never-blocking submission.
///
/// # Examples
///
/// ```
/// use conveyor::core::{Task, ThreadPool};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = ThreadPool::new(2);
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// pool.set_task_count(10);
/// for _ in 0..10 {
///     let hits = Arc::clone(&hits);
///     pool.submit(Task::new(move || {
///         hits.fetch_add(1, Ordering::SeqCst);
///     }));
/// }
/// pool.wait();
/// assert_eq!(hits.load(Ordering::SeqCst), 10);
/// ```
pub struct ThreadPool<Q: BlockingQueue<Task> + 'static = BoundedQueue<Task>> {
    queue: Arc<Q>,
    tracker: Arc<CompletionTracker>,
    counters: Arc<ExecutorCounters>,
    stopping: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl ThreadPool<BoundedQueue<Task>> {
    /// Creates a pool of `worker_count` threads draining a bounded queue with
    /// the default capacity.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero or a worker thread cannot be spawned.
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self::with_queue(BoundedQueue::default(), worker_count)
    }

    /// Changes the bounded queue's blocking threshold.
    ///
    /// Intended to be called right after construction, before tasks are
    /// submitted.
    pub fn set_queue_capacity(&self, capacity: usize) {
        self.queue.set_capacity(capacity);
    }
}

impl ThreadPool<UnboundedQueue<Task>> {
    /// Creates a pool draining an unbounded queue: `submit` never blocks, and
    /// nothing limits memory growth. Use only where task volume is bounded
    /// externally.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero or a worker thread cannot be spawned.
    #[must_use]
    pub fn unbounded(worker_count: usize) -> Self {
        Self::with_queue(UnboundedQueue::new(), worker_count)
    }
}

impl<Q: BlockingQueue<Task> + 'static> ThreadPool<Q> {
    /// Creates a pool draining the given queue.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count` is zero or a worker thread cannot be spawned.
    pub fn with_queue(queue: Q, worker_count: usize) -> Self {
        assert!(worker_count > 0, "thread pool needs at least one worker");

        let queue = Arc::new(queue);
        let tracker = Arc::new(CompletionTracker::new());
        let counters = Arc::new(ExecutorCounters::default());
        let stopping = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let queue = Arc::clone(&queue);
            let tracker = Arc::clone(&tracker);
            let counters = Arc::clone(&counters);
            let stopping = Arc::clone(&stopping);

            let handle = thread::Builder::new()
                .name(format!("conveyor-worker-{worker_id}"))
                .spawn(move || {
                    debug!(worker_id, "worker thread started");
                    let label = format!("worker-{worker_id}");
                    agent_loop(&label, &*queue, &tracker, &counters, &stopping, worker_count);
                    debug!(worker_id, "worker thread exiting");
                })
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        info!(worker_count, "thread pool initialized");

        Self {
            queue,
            tracker,
            counters,
            stopping,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Sets the number of completions after which the pool shuts down.
    ///
    /// Must be called with the true total before the corresponding tasks are
    /// submitted; see [`CompletionTracker`].
    pub fn set_task_count(&self, count: usize) {
        self.tracker.set_expected(count);
    }

    /// Enqueues a task, blocking under backpressure when the queue is full.
    ///
    /// Submitting after the completion count has reached zero is unsupported:
    /// the workers have already exited and the task will never run.
    pub fn submit(&self, task: Task) {
        if !task.is_poison() {
            self.counters
                .submitted_tasks
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
        self.queue.push(task);
    }

    /// Blocks until the expected completions have all run.
    ///
    /// Calling this before [`set_task_count`] has been given the true total
    /// is a contract violation: the count may read zero before any task was
    /// pushed and the wait returns early.
    ///
    /// [`set_task_count`]: ThreadPool::set_task_count
    pub fn wait(&self) {
        self.tracker.wait();
    }

    /// Initiates shutdown: idempotently flips the stop flag and pushes one
    /// poison sentinel per worker. Runs automatically when the completion
    /// count reaches zero; exposed for explicit early termination.
    pub fn stop_all(&self) {
        request_stop(&*self.queue, &self.stopping, self.worker_count);
    }

    /// Joins all worker threads. Workers only exit after consuming a poison
    /// sentinel, so call [`stop_all`] (or let the completion count reach
    /// zero) first.
    ///
    /// [`stop_all`]: ThreadPool::stop_all
    pub fn join(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread panicked outside task isolation");
            }
        }
    }

    /// Snapshot of this pool's counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        self.counters
            .snapshot(self.worker_count, self.tracker.remaining())
    }
}

impl<Q: BlockingQueue<Task> + 'static> TaskExecutor for ThreadPool<Q> {
    fn set_task_count(&self, count: usize) {
        Self::set_task_count(self, count);
    }

    fn submit(&self, task: Task) {
        Self::submit(self, task);
    }

    fn block_until_done(&self) {
        self.wait();
    }

    fn stop_all(&self) {
        Self::stop_all(self);
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Pool
    }

    fn stats(&self) -> ExecutorStats {
        Self::stats(self)
    }
}

impl<Q: BlockingQueue<Task> + 'static> Drop for ThreadPool<Q> {
    fn drop(&mut self) {
        // Workers must never outlive the pool. Sentinel pushes block behind
        // any queued work, so outstanding tasks finish first.
        self.stop_all();
        self.join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_tasks_execute_and_wait_returns() {
        let pool = ThreadPool::new(4);
        let hits = Arc::new(AtomicUsize::new(0));

        pool.set_task_count(50);
        for _ in 0..50 {
            let hits = Arc::clone(&hits);
            pool.submit(Task::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.wait();

        assert_eq!(hits.load(Ordering::SeqCst), 50);
        let stats = pool.stats();
        assert_eq!(stats.submitted_tasks, 50);
        assert_eq!(stats.completed_tasks, 50);
        assert_eq!(stats.pending_tasks, 0);
    }

    #[test]
    fn test_workers_join_after_completion() {
        let pool = ThreadPool::new(2);
        pool.set_task_count(4);
        for _ in 0..4 {
            pool.submit(Task::new(|| {}));
        }
        pool.wait();
        // Count exhaustion already poisoned every worker.
        pool.join();
        assert!(pool.workers.lock().is_empty());
    }

    #[test]
    fn test_explicit_stop_without_tasks() {
        let pool = ThreadPool::new(3);
        pool.stop_all();
        pool.join();
    }

    #[test]
    fn test_backpressure_on_submit() {
        let pool = ThreadPool::new(1);
        pool.set_queue_capacity(1);
        pool.set_task_count(3);

        let submitted = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(AtomicUsize::new(0));

        // First task occupies the single worker until the gate opens.
        let gate2 = Arc::clone(&gate);
        pool.submit(Task::new(move || {
            while gate2.load(Ordering::SeqCst) == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }));

        let pool = Arc::new(pool);
        let pool2 = Arc::clone(&pool);
        let submitted2 = Arc::clone(&submitted);
        let producer = thread::spawn(move || {
            for _ in 0..2 {
                pool2.submit(Task::new(|| {}));
                submitted2.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Queue capacity 1: the second submit must park until the worker
        // frees a slot.
        thread::sleep(Duration::from_millis(50));
        assert!(submitted.load(Ordering::SeqCst) <= 1);

        gate.store(1, Ordering::SeqCst);
        producer.join().unwrap();
        pool.wait();
        assert_eq!(submitted.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unbounded_pool_completes() {
        let pool = ThreadPool::unbounded(2);
        let hits = Arc::new(AtomicUsize::new(0));

        pool.set_task_count(100);
        for _ in 0..100 {
            let hits = Arc::clone(&hits);
            pool.submit(Task::new(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.wait();
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_panicking_task_counts_failed_and_wait_returns() {
        let pool = ThreadPool::new(2);
        pool.set_task_count(10);
        for i in 0..10 {
            pool.submit(Task::new(move || {
                assert!(i != 3, "task 3 exploded");
            }));
        }
        pool.wait();

        let stats = pool.stats();
        assert_eq!(stats.completed_tasks, 9);
        assert_eq!(stats.failed_tasks, 1);
    }
}
