//! Unbounded blocking queue.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::BlockingQueue;

/// A FIFO queue with no capacity limit.
///
/// `push` always succeeds immediately; `pop` blocks until an item arrives.
/// Without backpressure a fast producer can grow memory without limit, so this
/// variant is intended for workloads whose task volume is bounded externally.
/// Prefer [`BoundedQueue`](super::BoundedQueue) anywhere the producer can
/// outrun the consumers.
///
/// # Examples
///
/// ```
/// use conveyor::queue::{BlockingQueue, UnboundedQueue};
///
/// let q = UnboundedQueue::new();
/// q.push(1);
/// q.push(2);
/// assert_eq!(q.pop(), 1);
/// assert_eq!(q.pop(), 2);
/// ```
#[derive(Default)]
pub struct UnboundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> UnboundedQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }
}

impl<T: Send> BlockingQueue<T> for UnboundedQueue<T> {
    fn push(&self, item: T) {
        let mut queue = self.inner.lock();
        queue.push_back(item);
        self.not_empty.notify_one();
    }

    fn pop(&self) -> T {
        let mut queue = self.inner.lock();
        loop {
            if let Some(item) = queue.pop_front() {
                return item;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
