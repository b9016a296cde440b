//! Capacity-bounded blocking queue.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::BlockingQueue;

/// Default capacity used by [`BoundedQueue::default`].
pub const DEFAULT_CAPACITY: usize = 20;

struct Inner<T> {
    queue: VecDeque<T>,
    capacity: usize,
}

/// A FIFO queue with a fixed capacity.
///
/// `push` blocks the calling thread whenever the queue holds `capacity` items,
/// until a concurrent `pop` makes room; `pop` blocks whenever the queue is
/// empty, until a concurrent `push` arrives. A fast upstream producer
/// therefore stalls once a slow downstream consumer's queue fills, and the
/// stall propagates transitively backward through a chain of stages.
///
/// Producers and consumers wait on separate condition variables: a `pop`
/// wakes exactly one blocked producer, a `push` wakes exactly one blocked
/// consumer.
///
/// # Examples
///
/// ```
/// use conveyor::queue::{BlockingQueue, BoundedQueue};
///
/// let q = BoundedQueue::new(2);
/// q.push("a");
/// q.push("b");
/// // a third push would block until a pop makes room
/// assert_eq!(q.pop(), "a");
/// ```
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "bounded queue capacity must be at least 1");
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::with_capacity(capacity),
                capacity,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Changes the blocking threshold.
    ///
    /// Intended to be called after construction but before any concurrent use
    /// begins. Calling it later is safe: growing the capacity wakes producers
    /// already blocked on a full queue, shrinking it below the current length
    /// only affects future pushes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn set_capacity(&self, capacity: usize) {
        assert!(capacity > 0, "bounded queue capacity must be at least 1");
        let mut inner = self.inner.lock();
        let grew = capacity > inner.capacity;
        inner.capacity = capacity;
        if grew {
            self.not_full.notify_all();
        }
    }

    /// The current blocking threshold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<T: Send> BlockingQueue<T> for BoundedQueue<T> {
    fn push(&self, item: T) {
        let mut inner = self.inner.lock();
        while inner.queue.len() >= inner.capacity {
            self.not_full.wait(&mut inner);
        }
        inner.queue.push_back(item);
        self.not_empty.notify_one();
    }

    fn pop(&self) -> T {
        let mut inner = self.inner.lock();
        loop {
            if let Some(item) = inner.queue.pop_front() {
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let q = BoundedQueue::new(8);
        for i in 0..8 {
            q.push(i);
        }
        for i in 0..8 {
            assert_eq!(q.pop(), i);
        }
    }

    #[test]
    fn test_len_never_exceeds_capacity() {
        let q = Arc::new(BoundedQueue::new(4));
        let q2 = Arc::clone(&q);

        let producer = thread::spawn(move || {
            for i in 0..100 {
                q2.push(i);
            }
        });

        let mut popped = 0;
        while popped < 100 {
            assert!(q.len() <= 4);
            q.pop();
            popped += 1;
        }
        producer.join().unwrap();
        assert!(q.is_empty());
    }

    #[test]
    fn test_push_blocks_at_capacity() {
        let q = Arc::new(BoundedQueue::new(1));
        let pushed = Arc::new(AtomicUsize::new(0));

        let q2 = Arc::clone(&q);
        let pushed2 = Arc::clone(&pushed);
        let producer = thread::spawn(move || {
            for i in 0..3 {
                q2.push(i);
                pushed2.fetch_add(1, Ordering::SeqCst);
            }
        });

        // Only the first push can land; the producer must be parked on the
        // second until a pop makes room.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pushed.load(Ordering::SeqCst), 1);

        assert_eq!(q.pop(), 0);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(pushed.load(Ordering::SeqCst), 2);

        assert_eq!(q.pop(), 1);
        assert_eq!(q.pop(), 2);
        producer.join().unwrap();
        assert_eq!(pushed.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_set_capacity_wakes_blocked_producer() {
        let q = Arc::new(BoundedQueue::new(1));
        q.push(0);

        let q2 = Arc::clone(&q);
        let producer = thread::spawn(move || q2.push(1));

        thread::sleep(Duration::from_millis(20));
        q.set_capacity(2);
        producer.join().unwrap();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_set_capacity_before_use() {
        let q = BoundedQueue::new(1);
        q.set_capacity(8);
        assert_eq!(q.capacity(), 8);
        for i in 0..8 {
            q.push(i);
        }
        assert_eq!(q.len(), 8);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn test_zero_capacity_rejected() {
        let _ = BoundedQueue::<usize>::new(0);
    }
}
