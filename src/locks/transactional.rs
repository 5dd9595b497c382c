//! Lock-then-transact wrapper.

use super::guard::{ReleaseGuard, TransactionGuard};
use super::types::{Lock, TransactionResult};
use crate::error::ExclusiveError;
use crate::store::Store;
use std::sync::Arc;

/// Couples a held lock to a buffered store transaction.
///
/// The wrapped lock is released exactly once after every run, whether the
/// transaction committed, was discarded, or never started.
pub struct TransactionalLock<S: Store + ?Sized, L: Lock> {
    client: Arc<S>,
    lock: L,
}

impl<S: Store + ?Sized, L: Lock> TransactionalLock<S, L> {
    pub fn new(client: Arc<S>, lock: L) -> Self {
        Self { client, lock }
    }

    /// The wrapped lock.
    pub fn lock(&self) -> &L {
        &self.lock
    }

    pub fn into_inner(self) -> L {
        self.lock
    }

    /// Run `f` inside a transaction while holding the lock.
    ///
    /// Fails fast with [`ExclusiveError::LockAcquisition`] when the lock is
    /// busy; there is no retry at this layer. Writes issued by `f` through
    /// the store are committed when it returns `Ok` and discarded when it
    /// returns `Err`, in which case the error is returned unchanged.
    pub fn with_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<ExclusiveError>,
    {
        self.try_with_transaction(f)?
            .into_result()
            .ok_or_else(|| ExclusiveError::lock_acquisition().into())
    }

    /// Like [`with_transaction`](Self::with_transaction), but reports a busy
    /// lock as a [`TransactionResult`] that was not acquired.
    pub fn try_with_transaction<T, E, F>(&mut self, f: F) -> Result<TransactionResult<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<ExclusiveError>,
    {
        let mut lock = ReleaseGuard::new(&mut self.lock);
        if !lock.acquire()? {
            tracing::debug!("transaction skipped: lock is held elsewhere");
            return Ok(TransactionResult::not_acquired());
        }

        let transaction = TransactionGuard::begin(self.client.as_ref())?;
        let value = f()?;
        transaction.commit()?;

        Ok(TransactionResult::acquired(value))
    }
}
