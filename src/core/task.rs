//! The unit of deferred work moved through queues.

use std::fmt;

/// A queued unit of execution.
///
/// A task is either a deferred closure created at `push` time and executed
/// exactly once by whichever agent dequeues it, or a poison sentinel pushed
/// during shutdown. Sentinels carry no work: an agent that dequeues one
/// terminates its loop without executing anything, which is how a bounded
/// number of blocking agents is torn down deterministically (one sentinel
/// consumed per agent).
pub enum Task {
    /// Deferred work, executed exactly once by the dequeuing agent.
    Run(Box<dyn FnOnce() + Send + 'static>),
    /// Shutdown sentinel; discarded unexecuted.
    Poison,
}

impl Task {
    /// Wraps a closure as a runnable task.
    pub fn new<F>(job: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::Run(Box::new(job))
    }

    /// Whether this task is a shutdown sentinel.
    #[must_use]
    pub const fn is_poison(&self) -> bool {
        matches!(self, Self::Poison)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run(_) => f.write_str("Task::Run(..)"),
            Self::Poison => f.write_str("Task::Poison"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_run_task_executes_once() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran2 = Arc::clone(&ran);
        let task = Task::new(move || ran2.store(true, Ordering::SeqCst));

        assert!(!task.is_poison());
        if let Task::Run(job) = task {
            job();
        }
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_poison_is_poison() {
        assert!(Task::Poison.is_poison());
        assert_eq!(format!("{:?}", Task::Poison), "Task::Poison");
    }
}
