//! Lock capability trait and transaction outcome.

use super::guard::ReleaseGuard;
use crate::error::{ExclusiveError, Result};
use std::thread;
use std::time::{Duration, Instant};

/// Default upper bound on how long `acquire_with_retry` keeps polling.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(3000);

/// Default pause between polling attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(100);

/// Capabilities shared by every lock variant.
pub trait Lock {
    /// Attempt to take the lock once.
    ///
    /// Returns `Ok(false)` when someone (including this instance) already
    /// holds it. Locks are not reentrant.
    ///
    /// A refused attempt leaves the cached state untouched: a lock that is
    /// already held keeps reporting `is_locked() == true` and can still be
    /// released. Implementations that mirror the store result into the cache
    /// (`locked = result`) would forget the hold here.
    fn acquire(&mut self) -> Result<bool>;

    /// Poll `acquire` every `backoff` until it succeeds or `max_wait` has
    /// elapsed since the first attempt.
    ///
    /// Blocks the calling thread. The interval is fixed; there is no jitter
    /// and no wake-up on release.
    fn acquire_with_retry(&mut self, max_wait: Duration, backoff: Duration) -> Result<bool> {
        let start = Instant::now();

        loop {
            if self.acquire()? {
                return Ok(true);
            }

            if start.elapsed() >= max_wait {
                return Ok(false);
            }

            thread::sleep(backoff);
        }
    }

    /// Release the lock.
    ///
    /// Returns `Ok(false)` without touching the store when this instance
    /// does not believe it holds the lock.
    fn release(&mut self) -> Result<bool>;

    /// Cached lock state. Not re-checked against the store.
    fn is_locked(&self) -> bool;

    /// Run `f` only if the lock can be taken, releasing it afterwards.
    ///
    /// Returns `Ok(None)` without running `f` when the lock is busy. Errors
    /// from `f` are returned unchanged after the release.
    fn acquire_with<T, E, F>(&mut self, f: F) -> std::result::Result<Option<T>, E>
    where
        Self: Sized,
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<ExclusiveError>,
    {
        if !self.acquire()? {
            return Ok(None);
        }

        let _guard = ReleaseGuard::new(self);
        f().map(Some)
    }
}

/// Outcome of a transactional execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult<T> {
    acquired: bool,
    result: Option<T>,
}

impl<T> TransactionResult<T> {
    pub(crate) fn acquired(result: T) -> Self {
        Self {
            acquired: true,
            result: Some(result),
        }
    }

    pub(crate) fn not_acquired() -> Self {
        Self {
            acquired: false,
            result: None,
        }
    }

    /// Check if the lock was acquired and the callback ran.
    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    /// The callback's result. `None` when the lock was not acquired.
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Consume the outcome, yielding the callback's result if it ran.
    pub fn into_result(self) -> Option<T> {
        self.result
    }
}
