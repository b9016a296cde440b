//! The pop/execute/decrement loop shared by pool workers and inline callers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

use crate::queue::BlockingQueue;

use super::executor::ExecutorCounters;
use super::task::Task;
use super::tracker::CompletionTracker;

/// Drains the queue until one poison sentinel is consumed.
///
/// Every executed task decrements the tracker; the agent that observes the
/// 1 → 0 edge issues the stop request itself, so shutdown needs no external
/// coordinator. A panicking task is isolated, counted as failed, and still
/// decrements the tracker, so waiters are never stranded by a bad closure.
pub(crate) fn agent_loop<Q: BlockingQueue<Task>>(
    label: &str,
    queue: &Q,
    tracker: &CompletionTracker,
    counters: &ExecutorCounters,
    stopping: &AtomicBool,
    sentinel_count: usize,
) {
    loop {
        match queue.pop() {
            Task::Poison => break,
            Task::Run(job) => {
                match panic::catch_unwind(AssertUnwindSafe(job)) {
                    Ok(()) => {
                        counters.completed_tasks.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(payload) => {
                        counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                        error!(agent = label, "task panicked: {}", panic_message(&payload));
                    }
                }
                if tracker.complete_one() {
                    request_stop(queue, stopping, sentinel_count);
                }
            }
        }
    }
}

/// Idempotently initiates shutdown: the first caller flips the stop flag and
/// pushes one poison sentinel per agent using the queue's normal blocking
/// push, so shutdown honors backpressure like any other producer.
pub(crate) fn request_stop<Q: BlockingQueue<Task>>(
    queue: &Q,
    stopping: &AtomicBool,
    sentinel_count: usize,
) {
    if !stopping.swap(true, Ordering::AcqRel) {
        for _ in 0..sentinel_count {
            queue.push(Task::Poison);
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::BoundedQueue;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn test_agent_loop_exits_on_poison() {
        let queue = BoundedQueue::new(8);
        let tracker = CompletionTracker::new();
        let counters = ExecutorCounters::default();
        let stopping = AtomicBool::new(false);

        let ran = Arc::new(AtomicUsize::new(0));
        tracker.set_expected(2);
        for _ in 0..2 {
            let ran = Arc::clone(&ran);
            queue.push(Task::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        // Count exhaustion pushes the sentinel that ends the loop.
        agent_loop("test", &queue, &tracker, &counters, &stopping, 1);

        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert!(stopping.load(Ordering::SeqCst));
        assert_eq!(counters.completed_tasks.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_panicking_task_still_decrements() {
        let queue = BoundedQueue::new(8);
        let tracker = CompletionTracker::new();
        let counters = ExecutorCounters::default();
        let stopping = AtomicBool::new(false);

        tracker.set_expected(2);
        queue.push(Task::new(|| panic!("boom")));
        queue.push(Task::new(|| {}));

        agent_loop("test", &queue, &tracker, &counters, &stopping, 1);

        assert_eq!(counters.completed_tasks.load(Ordering::Relaxed), 1);
        assert_eq!(counters.failed_tasks.load(Ordering::Relaxed), 1);
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_request_stop_is_idempotent() {
        let queue = BoundedQueue::new(8);
        let stopping = AtomicBool::new(false);

        request_stop(&queue, &stopping, 3);
        request_stop(&queue, &stopping, 3);
        assert_eq!(queue.len(), 3);
    }
}
