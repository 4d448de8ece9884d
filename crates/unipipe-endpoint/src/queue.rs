use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Unbounded thread-safe FIFO of pending outgoing serialized messages.
///
/// Fed by the public send API (any thread), drained only by the writer loop.
/// Insertion order is send order. The queue is cleared, not delivered,
/// whenever a session ends — entries queued against a dead connection never
/// cross into the next session.
#[derive(Debug, Default)]
pub struct SendQueue {
    inner: Mutex<VecDeque<String>>,
}

impl SendQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a serialized message.
    pub fn push(&self, msg: String) {
        self.lock().push_back(msg);
    }

    /// Take the oldest pending message, if any.
    pub fn pop(&self) -> Option<String> {
        self.lock().pop_front()
    }

    /// Discard every pending message.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of pending messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<String>> {
        // A panicked producer leaves the queue itself intact; keep going.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
