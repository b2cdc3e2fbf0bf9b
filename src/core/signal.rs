//! Failure signal for unit watcher threads.
//!
//! A capability unit that spawns a background watcher (say, polling the
//! readiness of a process it started) reports failure through exactly one
//! of these: an idempotently settable flag the waiting action polls
//! cooperatively. No other shared mutable state crosses the thread
//! boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

#[derive(Clone, Default)]
pub struct FailureSignal {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    set: AtomicBool,
    message: Mutex<Option<String>>,
}

impl FailureSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. The first call wins; later calls are ignored.
    pub fn set(&self, message: impl Into<String>) {
        let mut slot = self.inner.message.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(message.into());
            self.inner.set.store(true, Ordering::Release);
        }
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::Acquire)
    }

    pub fn message(&self) -> Option<String> {
        self.inner
            .message
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Return the failure as an action error when the signal fired.
    pub fn check(&self, unit: &str, member: &str) -> Result<()> {
        match self.message() {
            Some(message) => Err(Error::action_failed(unit, member, message)),
            None => Ok(()),
        }
    }

    /// Poll cooperatively until the signal fires or the timeout elapses.
    /// Returns true when the signal fired, false on timeout.
    pub fn wait_for(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_set() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now())));
        }
    }
}
