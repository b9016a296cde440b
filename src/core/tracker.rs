//! Completion accounting shared between an executor's agents and its waiters.

use parking_lot::{Condvar, Mutex};

/// Counts outstanding tasks and wakes waiters when the count reaches zero.
///
/// The expected total must be set with [`set_expected`] before any task that
/// decrements it starts executing; otherwise a waiter can observe a zero count
/// before any work has been pushed and return early. This is a documented
/// precondition, not something the tracker detects.
///
/// The 1 → 0 transition is a one-time edge trigger: exactly one call to
/// [`complete_one`] returns `true` for a given expected total, and that call
/// is the executor's cue to begin shutdown.
///
/// The counter is guarded by its own mutex, distinct from any queue lock, and
/// the condition variable is always signaled under that mutex so wakeups
/// cannot be missed.
///
/// [`set_expected`]: CompletionTracker::set_expected
/// [`complete_one`]: CompletionTracker::complete_one
#[derive(Debug, Default)]
pub struct CompletionTracker {
    remaining: Mutex<usize>,
    done: Condvar,
}

impl CompletionTracker {
    /// Creates a tracker with zero expected tasks.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: Mutex::new(0),
            done: Condvar::new(),
        }
    }

    /// Sets the number of completions after which waiters are released.
    ///
    /// Must be called before pushing the tasks it accounts for.
    pub fn set_expected(&self, count: usize) {
        let mut remaining = self.remaining.lock();
        *remaining = count;
        if count == 0 {
            self.done.notify_all();
        }
    }

    /// Records one completed task.
    ///
    /// Returns `true` exactly when this call moved the count from one to
    /// zero, waking all waiters. Calls beyond the expected total saturate at
    /// zero and return `false`.
    pub fn complete_one(&self) -> bool {
        let mut remaining = self.remaining.lock();
        let was = *remaining;
        *remaining = was.saturating_sub(1);
        if was == 1 {
            self.done.notify_all();
            true
        } else {
            false
        }
    }

    /// Blocks the calling thread until the count reaches zero.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining != 0 {
            self.done.wait(&mut remaining);
        }
    }

    /// Current outstanding count. Advisory snapshot for logging and stats.
    #[must_use]
    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_edge_trigger_fires_once() {
        let tracker = CompletionTracker::new();
        tracker.set_expected(3);

        assert!(!tracker.complete_one());
        assert!(!tracker.complete_one());
        assert!(tracker.complete_one());
        // Saturates; the edge does not re-fire.
        assert!(!tracker.complete_one());
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_wait_returns_at_zero_not_before() {
        let tracker = Arc::new(CompletionTracker::new());
        tracker.set_expected(2);

        let t2 = Arc::clone(&tracker);
        let waiter = thread::spawn(move || t2.wait());

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        tracker.complete_one();

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        tracker.complete_one();

        waiter.join().unwrap();
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_wait_with_zero_expected_returns_immediately() {
        let tracker = CompletionTracker::new();
        tracker.set_expected(0);
        tracker.wait();
    }

    #[test]
    fn test_multiple_waiters_all_released() {
        let tracker = Arc::new(CompletionTracker::new());
        tracker.set_expected(1);

        let mut waiters = vec![];
        for _ in 0..4 {
            let t = Arc::clone(&tracker);
            waiters.push(thread::spawn(move || t.wait()));
        }

        thread::sleep(Duration::from_millis(20));
        assert!(tracker.complete_one());
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
