//! Blocking FIFO queue primitives.
//!
//! Two variants share one contract: `push` appends to the tail, `pop` blocks
//! the calling thread until an item is available and removes the head. The
//! [`UnboundedQueue`] never blocks producers; the [`BoundedQueue`] blocks
//! producers at capacity, which is the backpressure mechanism the rest of the
//! crate is built on.
//!
//! Both are built on `parking_lot` mutexes and condition variables and park
//! waiting threads instead of spinning.

mod bounded;
mod unbounded;

pub use bounded::BoundedQueue;
pub use unbounded::UnboundedQueue;

/// Common contract for blocking FIFO queues.
///
/// Executors are generic over this trait so the same worker loop can drain a
/// bounded (backpressured) or unbounded queue.
pub trait BlockingQueue<T: Send>: Send + Sync {
    /// Append an item to the tail. May block the caller until space is
    /// available, depending on the implementation.
    fn push(&self, item: T);

    /// Remove and return the head item, blocking until one is present.
    fn pop(&self) -> T;

    /// Whether the queue is currently empty.
    ///
    /// This is a point-in-time snapshot, not a synchronization primitive:
    /// a concurrent `push` or `pop` can invalidate the answer before the
    /// caller acts on it.
    fn is_empty(&self) -> bool;

    /// Number of items currently resident. Advisory, like [`is_empty`].
    ///
    /// [`is_empty`]: BlockingQueue::is_empty
    fn len(&self) -> usize;
}
