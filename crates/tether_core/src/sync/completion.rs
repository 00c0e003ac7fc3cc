//! One-shot completion signal, and the surface release ticket built on it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Signal for one-shot completion.
struct CompletionSignal {
    done: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CompletionSignal {
    fn new(done: bool) -> Self {
        Self {
            done: AtomicBool::new(done),
            condvar: Condvar::new(),
            mutex: Mutex::new(()),
        }
    }

    /// Returns true if this call did the signalling.
    fn signal(&self) -> bool {
        // Taken so a waiter between its check and its wait cannot miss us.
        let _guard = self.mutex.lock();
        let first = !self.done.swap(true, Ordering::AcqRel);
        self.condvar.notify_all();
        first
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    fn wait(&self) {
        if self.is_done() {
            return;
        }
        let mut guard = self.mutex.lock();
        while !self.is_done() {
            self.condvar.wait(&mut guard);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_done() {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let mut guard = self.mutex.lock();
        while !self.is_done() {
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_done()
    }
}

/// Ticket returned when the host reports a destroyed surface.
///
/// Once released, no frame will be presented to the destroyed window, and the
/// host may free it. Clones share the same state.
#[derive(Clone)]
pub struct SurfaceRelease {
    signal: Arc<CompletionSignal>,
}

impl SurfaceRelease {
    /// Creates an unresolved ticket.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            signal: Arc::new(CompletionSignal::new(false)),
        }
    }

    /// Creates an already-resolved ticket.
    #[must_use]
    pub fn released() -> Self {
        Self {
            signal: Arc::new(CompletionSignal::new(true)),
        }
    }

    /// Resolves the ticket and wakes every waiter. Idempotent; returns true
    /// only for the call that resolved it.
    pub fn mark_released(&self) -> bool {
        self.signal.signal()
    }

    /// Returns true once the window may be freed.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.signal.is_done()
    }

    /// Blocks until released.
    pub fn wait(&self) {
        self.signal.wait();
    }

    /// Blocks until released or `timeout` elapses. Returns true if released.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.signal.wait_timeout(timeout)
    }
}

impl fmt::Debug for SurfaceRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceRelease")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_release_wakes_waiter() {
        let ticket = SurfaceRelease::pending();
        let waiter = ticket.clone();

        let handle = thread::spawn(move || {
            waiter.wait();
            waiter.is_released()
        });

        thread::sleep(Duration::from_millis(10));
        assert!(ticket.mark_released());
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_release_is_idempotent() {
        let ticket = SurfaceRelease::pending();
        assert!(!ticket.is_released());
        assert!(ticket.mark_released());
        assert!(!ticket.mark_released());
        assert!(ticket.is_released());
    }

    #[test]
    fn test_wait_timeout_expires() {
        let ticket = SurfaceRelease::pending();
        assert!(!ticket.wait_timeout(Duration::from_millis(5)));
        assert!(SurfaceRelease::released().wait_timeout(Duration::ZERO));
    }
}
