use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Cooperative, terminal cancellation signal shared by an endpoint's
/// supervisor, strategies and loops.
///
/// Cancellation is checked at every loop top and woken into every bounded
/// sleep, so no task keeps sleeping through a shutdown. There is no resume.
#[derive(Clone, Debug, Default)]
pub struct Cancel {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl Cancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter.
    pub fn cancel(&self) {
        let mut cancelled = self.lock();
        *cancelled = true;
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Sleep for `timeout` unless cancelled first.
    ///
    /// Returns `true` when cancellation cut the sleep short (or had already
    /// been requested), `false` when the full timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        let mut cancelled = self.lock();
        while !*cancelled {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let (guard, _result) = self
                .inner
                .cond
                .wait_timeout(cancelled, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let cancel = Cancel::new();
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn wait_runs_full_timeout_without_cancel() {
        let cancel = Cancel::new();
        let start = std::time::Instant::now();
        assert!(!cancel.wait_timeout(Duration::from_millis(50)));
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn cancel_wakes_waiter_early() {
        let cancel = Cancel::new();
        let waiter = cancel.clone();

        let handle = std::thread::spawn(move || {
            let start = std::time::Instant::now();
            let cancelled = waiter.wait_timeout(Duration::from_secs(10));
            (cancelled, start.elapsed())
        });

        std::thread::sleep(Duration::from_millis(50));
        cancel.cancel();

        let (cancelled, elapsed) = handle.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn wait_after_cancel_returns_immediately() {
        let cancel = Cancel::new();
        cancel.cancel();

        let start = std::time::Instant::now();
        assert!(cancel.wait_timeout(Duration::from_secs(5)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn clones_share_state() {
        let cancel = Cancel::new();
        let clone = cancel.clone();
        clone.cancel();
        assert!(cancel.is_cancelled());
    }
}
