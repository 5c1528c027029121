//! Blocking helpers that do NOT advance the tick loop.
//!
//! Use these only when nothing needs to move while the caller waits. To keep
//! the engine running while waiting, use the `Engine::tick_*` helpers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Block the calling thread for `duration` without ticking.
pub fn wait(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// One-shot flag another thread can raise to wake a waiter.
///
/// Clones share the same flag.
#[derive(Clone, Default)]
pub struct Signal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag and wake every waiter.
    pub fn set(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock() = true;
        cvar.notify_all();
    }

    /// Lower the flag.
    pub fn reset(&self) {
        *self.inner.0.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Block until the flag is raised or `timeout` elapses. Returns whether
    /// the flag was raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut raised = flag.lock();
        while !*raised {
            if cvar.wait_until(&mut raised, deadline).timed_out() {
                break;
            }
        }
        *raised
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal").field("set", &self.is_set()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_times_out() {
        let signal = Signal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_signal_wakes_waiter() {
        let signal = Signal::new();
        let remote = signal.clone();
        let handle = std::thread::spawn(move || {
            wait(Duration::from_millis(10));
            remote.set();
        });
        assert!(signal.wait_timeout(Duration::from_secs(5)));
        handle.join().unwrap();

        signal.reset();
        assert!(!signal.is_set());
    }
}
