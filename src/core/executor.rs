//! Executor capability trait shared by pool and inline strategies.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::task::Task;

/// How an executor acquires its execution agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Dedicated worker threads owned by the executor.
    Pool,
    /// No dedicated agents; the caller's thread drives execution via `run`.
    Inline,
}

/// The capability surface a stage needs from its executor.
///
/// Both strategies implement the same small contract (accept a task, set the
/// expected completion count, block until done), so a pipeline can mix
/// pool-backed and inline-backed stages and forward tokens between them
/// without knowing the concrete executor type.
pub trait TaskExecutor: Send + Sync {
    /// Sets the number of task completions after which the executor shuts
    /// down and releases waiters.
    ///
    /// Must be called with the true total before the tasks it accounts for
    /// are pushed; see [`CompletionTracker`](super::CompletionTracker).
    fn set_task_count(&self, count: usize);

    /// Enqueues a task. Blocks under backpressure when the underlying queue
    /// is bounded and full.
    fn submit(&self, task: Task);

    /// Blocks the calling thread until the expected completions have all run.
    ///
    /// For a pool executor this parks the caller while dedicated workers
    /// drain the queue. For an inline executor the caller *becomes* the
    /// agent: this call runs the pop/execute loop on the current thread until
    /// a shutdown sentinel is consumed.
    fn block_until_done(&self);

    /// Initiates shutdown without waiting for the completion count: flips the
    /// stop flag (idempotently) and issues one poison sentinel per agent.
    /// This is the same path taken automatically on count exhaustion;
    /// exposed for explicit early termination.
    fn stop_all(&self);

    /// Which execution strategy backs this executor.
    fn mode(&self) -> ExecutionMode;

    /// Snapshot of this executor's counters.
    fn stats(&self) -> ExecutorStats;
}

/// Point-in-time view of an executor's activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Number of dedicated agents (zero for inline executors).
    pub worker_count: usize,
    /// Tasks accepted via `submit`.
    pub submitted_tasks: u64,
    /// Tasks that ran to completion.
    pub completed_tasks: u64,
    /// Tasks whose closure panicked. Failed tasks still count toward
    /// completion so waiters are never stranded.
    pub failed_tasks: u64,
    /// Completions still outstanding.
    pub pending_tasks: usize,
}

/// Lock-free counters backing [`ExecutorStats`].
#[derive(Debug, Default)]
pub(crate) struct ExecutorCounters {
    pub submitted_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

impl ExecutorCounters {
    pub fn snapshot(&self, worker_count: usize, pending_tasks: usize) -> ExecutorStats {
        ExecutorStats {
            worker_count,
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            pending_tasks,
        }
    }
}
