//! The deferred callback queue.
//!
//! Any thread may [`push`](CallbackQueue::push) a callback; only the thread
//! that owns the context calls [`process`](CallbackQueue::process). That
//! split is what keeps game state single-writer: the network thread and
//! event handlers describe *what* should happen, and the main thread
//! decides *when*, at a fixed point in the tick.
//!
//! Callbacks receive the context by `&mut`, so they never need to capture
//! a reference to it. Everything a callback captures must be owned and
//! `Send`, typically an id or a value that is being handed over.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A queued unit of work over a context of type `C`.
pub type Callback<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Thread-safe FIFO of callbacks, drained once per tick.
pub struct CallbackQueue<C> {
    pending: Mutex<VecDeque<Callback<C>>>,
}

impl<C> CallbackQueue<C> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a callback. Safe to call from any thread.
    pub fn push(&self, callback: impl FnOnce(&mut C) + Send + 'static) {
        self.lock().push_back(Box::new(callback));
    }

    /// Number of callbacks waiting for the next drain.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs every callback that was queued before this call, in FIFO
    /// order, and returns how many ran.
    ///
    /// The pending list is swapped out before the first callback runs, so
    /// the lock is not held while callbacks execute. A callback that
    /// pushes onto this same queue does not deadlock; its callback runs on
    /// the next drain.
    pub fn process(&self, context: &mut C) -> usize {
        let batch = std::mem::take(&mut *self.lock());
        let count = batch.len();
        for callback in batch {
            callback(context);
        }
        if count > 0 {
            tracing::trace!(count, "deferred callbacks processed");
        }
        count
    }

    // A panicking callback runs outside the lock, so poisoning can only
    // come from a panic inside push/len. The queue itself is still valid.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Callback<C>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C> Default for CallbackQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for CallbackQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_process_runs_callbacks_in_fifo_order() {
        let queue = CallbackQueue::<Vec<u32>>::new();
        queue.push(|log| log.push(1));
        queue.push(|log| log.push(2));
        queue.push(|log| log.push(3));

        let mut log = Vec::new();
        assert_eq!(queue.process(&mut log), 3);
        assert_eq!(log, vec![1, 2, 3]);
    }

    #[test]
    fn test_process_consumes_each_callback_once() {
        let queue = CallbackQueue::<u32>::new();
        queue.push(|n| *n += 1);

        let mut n = 0;
        queue.process(&mut n);
        queue.process(&mut n);

        assert_eq!(n, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_process_empty_queue_returns_zero() {
        let queue = CallbackQueue::<()>::new();
        assert_eq!(queue.process(&mut ()), 0);
    }

    #[test]
    fn test_push_during_process_runs_on_next_drain() {
        let queue = Arc::new(CallbackQueue::<Vec<&'static str>>::new());
        let requeue = Arc::clone(&queue);
        queue.push(move |log| {
            log.push("outer");
            requeue.push(|log| log.push("inner"));
        });

        let mut log = Vec::new();
        assert_eq!(queue.process(&mut log), 1);
        assert_eq!(log, vec!["outer"]);
        assert_eq!(queue.len(), 1);

        queue.process(&mut log);
        assert_eq!(log, vec!["outer", "inner"]);
    }

    #[test]
    fn test_push_from_other_threads_is_drained_on_owner() {
        let queue = Arc::new(CallbackQueue::<Vec<u32>>::new());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        queue.push(move |log| log.push(i * 100 + j));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut log = Vec::new();
        assert_eq!(queue.process(&mut log), 100);

        // Each producer's own pushes stay in order.
        for i in 0..4 {
            let mine: Vec<_> = log.iter().copied().filter(|v| v / 100 == i).collect();
            let expected: Vec<_> = (0..25).map(|j| i * 100 + j).collect();
            assert_eq!(mine, expected);
        }
    }
}
