//! Flush queue — FIFO of "this file has a batch ready" notifications.
//!
//! The queue carries archive paths only; the batches themselves stay in the
//! cache until the worker performs the handoff. One lock, one condition
//! variable, wake-on-push. Lock ordering contract: whoever also holds the
//! cache lock must have taken it before touching this queue.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Unbounded FIFO with wake-on-push and cooperative shutdown.
pub struct FlushQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
}

struct QueueInner {
    entries: VecDeque<String>,
    shutdown: bool,
}

impl FlushQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                entries: VecDeque::new(),
                shutdown: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Append a path and wake the worker.
    ///
    /// Returns `false` once the queue has been shut down; the caller's cache
    /// entry then stays idle and a later insert retries.
    pub fn push(&self, path: String) -> bool {
        let mut inner = self.inner.lock();
        if inner.shutdown {
            return false;
        }
        inner.entries.push_back(path);
        self.ready.notify_one();
        true
    }

    /// Block until an entry arrives or shutdown is signalled.
    ///
    /// After shutdown the queue drains: remaining entries are still handed
    /// out, and only then does `pop` return `None`.
    pub fn pop(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(path) = inner.entries.pop_front() {
                return Some(path);
            }
            if inner.shutdown {
                return None;
            }
            self.ready.wait(&mut inner);
        }
    }

    /// Signal shutdown and wake every waiter.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shutdown = true;
        self.ready.notify_all();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shutdown
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for FlushQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fifo_order() {
        let queue = FlushQueue::new();
        assert!(queue.push("a.rrd".to_string()));
        assert!(queue.push("b.rrd".to_string()));
        assert_eq!(queue.pop(), Some("a.rrd".to_string()));
        assert_eq!(queue.pop(), Some("b.rrd".to_string()));
    }

    #[test]
    fn push_after_shutdown_fails() {
        let queue = FlushQueue::new();
        queue.shutdown();
        assert!(!queue.push("a.rrd".to_string()));
    }

    #[test]
    fn shutdown_drains_before_terminating() {
        let queue = FlushQueue::new();
        queue.push("a.rrd".to_string());
        queue.push("b.rrd".to_string());
        queue.shutdown();
        assert_eq!(queue.pop(), Some("a.rrd".to_string()));
        assert_eq!(queue.pop(), Some("b.rrd".to_string()));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn pop_blocks_until_push() {
        let queue = Arc::new(FlushQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.pop())
        };
        std::thread::sleep(Duration::from_millis(50));
        queue.push("late.rrd".to_string());
        assert_eq!(consumer.join().unwrap(), Some("late.rrd".to_string()));
    }

    #[test]
    fn pop_unblocks_on_shutdown() {
        let queue = Arc::new(FlushQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || queue.pop())
        };
        std::thread::sleep(Duration::from_millis(50));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), None);
    }
}
