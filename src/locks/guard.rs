//! RAII guards for scoped lock and transaction cleanup.

use super::types::Lock;
use crate::error::Result;
use crate::store::{Reply, Store};
use std::ops::{Deref, DerefMut};

/// RAII guard that releases a lock.
///
/// When dropped, `release()` runs on the wrapped lock exactly once.
/// If the release fails, a warning is logged but no panic occurs.
#[derive(Debug)]
pub struct ReleaseGuard<'a, L: Lock + ?Sized> {
    lock: &'a mut L,

    /// Whether the lock has been released manually.
    released: bool,
}

impl<'a, L: Lock + ?Sized> ReleaseGuard<'a, L> {
    pub fn new(lock: &'a mut L) -> Self {
        Self {
            lock,
            released: false,
        }
    }

    /// Manually release the lock and observe the outcome.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.lock.release()
    }
}

impl<L: Lock + ?Sized> Deref for ReleaseGuard<'_, L> {
    type Target = L;

    fn deref(&self) -> &L {
        self.lock
    }
}

impl<L: Lock + ?Sized> DerefMut for ReleaseGuard<'_, L> {
    fn deref_mut(&mut self) -> &mut L {
        self.lock
    }
}

impl<L: Lock + ?Sized> Drop for ReleaseGuard<'_, L> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.lock.release()
        {
            tracing::warn!("failed to release lock: {}", e);
        }
    }
}

/// RAII guard over an open store transaction.
///
/// Dropping the guard without calling [`TransactionGuard::commit`] discards
/// every queued write.
#[derive(Debug)]
pub struct TransactionGuard<'a, S: Store + ?Sized> {
    client: &'a S,

    /// Whether the transaction was committed.
    finished: bool,
}

impl<'a, S: Store + ?Sized> TransactionGuard<'a, S> {
    /// Open a transaction block on `client`.
    pub fn begin(client: &'a S) -> Result<Self> {
        client.multi()?;
        Ok(Self {
            client,
            finished: false,
        })
    }

    /// Apply the queued writes.
    pub fn commit(mut self) -> Result<Vec<Reply>> {
        self.finished = true;
        self.client.exec()
    }
}

impl<S: Store + ?Sized> Drop for TransactionGuard<'_, S> {
    fn drop(&mut self) {
        if !self.finished
            && let Err(e) = self.client.discard()
        {
            tracing::warn!("failed to discard transaction: {}", e);
        }
    }
}
