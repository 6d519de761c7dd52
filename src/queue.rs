//! Bounded drop-oldest queues connecting the capture, decode and transmit
//! contexts.
//!
//! Pushes are wait-free from the producer's point of view: when the queue
//! is full the oldest element is discarded, never the producer blocked.
//! That is the right failure mode for both uses — a dropped pulse record
//! just makes the framer resynchronize at the next preamble, and a dropped
//! outbound command is simply superseded by the newer one.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use heapless::Deque;

/// A bounded FIFO with drop-oldest overflow and a consumer wake signal.
pub struct DropOldestQueue<T, const N: usize> {
    items: Mutex<CriticalSectionRawMutex, RefCell<Deque<T, N>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl<T, const N: usize> DropOldestQueue<T, N> {
    /// An empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(RefCell::new(Deque::new())),
            ready: Signal::new(),
        }
    }

    /// Appends an element, discarding the oldest one when full.
    ///
    /// Returns `false` when something was discarded to make room.
    pub fn push(&self, item: T) -> bool {
        let kept_all = self.items.lock(|items| {
            let mut items = items.borrow_mut();
            let mut kept_all = true;
            while items.is_full() {
                items.pop_front();
                kept_all = false;
            }
            // Cannot fail: the loop above just made room.
            let _ = items.push_back(item);
            kept_all
        });
        self.ready.signal(());
        kept_all
    }

    /// Removes the oldest element without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock(|items| items.borrow_mut().pop_front())
    }

    /// Number of queued elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock(|items| items.borrow().len())
    }

    /// True when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits up to `timeout` for an element.
    ///
    /// Returns `None` on timeout, exactly like the non-blocking pop on an
    /// empty queue.
    pub async fn pop(&self, timeout: Duration) -> Option<T> {
        loop {
            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if with_timeout(timeout, self.ready.wait()).await.is_err() {
                return self.try_pop();
            }
        }
    }
}

impl<T, const N: usize> Default for DropOldestQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    // Links the std critical-section implementation into the test binary.
    use critical_section as _;

    use super::*;

    #[test]
    fn fifo_order() {
        let queue: DropOldestQueue<u8, 4> = DropOldestQueue::new();
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn overflow_drops_the_oldest() {
        let queue: DropOldestQueue<u8, 2> = DropOldestQueue::new();
        assert!(queue.push(1));
        assert!(queue.push(2));
        assert!(!queue.push(3));
        assert_eq!(queue.try_pop(), Some(2));
        assert_eq!(queue.try_pop(), Some(3));
    }
}
