//! All-or-nothing lock over several keys.

use super::single::SingleKeyLock;
use super::types::Lock;
use crate::error::Result;
use crate::store::Store;
use std::sync::Arc;
use std::time::Duration;

/// Exclusive lock on a set of keys.
///
/// Keys are sorted by byte order and deduplicated at construction, then
/// acquired strictly in that order.
pub struct MultiKeyLock<S: Store + ?Sized> {
    locks: Vec<SingleKeyLock<S>>,
    locked: bool,
}

impl<S: Store + ?Sized> MultiKeyLock<S> {
    /// Create a lock on `prefix + key` for each of `keys`.
    pub fn new<I, K>(
        client: Arc<S>,
        keys: I,
        ttl: Duration,
        owner: impl Into<String>,
        prefix: &str,
    ) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let owner = owner.into();

        let mut sorted: Vec<String> = keys.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();

        let locks = sorted
            .into_iter()
            .map(|key| {
                SingleKeyLock::new(
                    Arc::clone(&client),
                    format!("{}{}", prefix, key),
                    ttl,
                    owner.clone(),
                )
            })
            .collect();

        Self {
            locks,
            locked: false,
        }
    }

    /// Full store keys in acquisition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locks.iter().map(|lock| lock.key())
    }

    /// Bind every sub-lock to a logical database, selected before each
    /// store round-trip.
    pub fn with_database(mut self, database: u32) -> Self {
        self.locks = self
            .locks
            .into_iter()
            .map(|lock| lock.with_database(database))
            .collect();
        self
    }

    /// Release the sub-locks `0..taken` taken by the current attempt.
    ///
    /// A blocked attempt on an already held lock takes nothing, so the
    /// earlier hold survives it.
    fn undo(&mut self, taken: usize) -> Result<()> {
        if self.locked {
            return Ok(());
        }

        let mut first_error = None;
        for lock in &mut self.locks[..taken] {
            if let Err(e) = lock.release() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<S: Store + ?Sized> Lock for MultiKeyLock<S> {
    fn acquire(&mut self) -> Result<bool> {
        for index in 0..self.locks.len() {
            match self.locks[index].acquire() {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(key = %self.locks[index].key(), "multi-key acquire blocked");
                    self.undo(index)?;
                    return Ok(false);
                }
                Err(e) => {
                    if let Err(undo) = self.undo(index) {
                        tracing::warn!("failed to undo partial multi-key acquire: {}", undo);
                    }
                    return Err(e);
                }
            }
        }

        self.locked = true;
        Ok(true)
    }

    /// Release every sub-lock, including ones this instance never took.
    ///
    /// Returns `Ok(true)` once every sub-release has been attempted; the
    /// first store failure, if any, is returned after the rest ran.
    fn release(&mut self) -> Result<bool> {
        let mut first_error = None;

        for lock in &mut self.locks {
            if let Err(e) = lock.release() {
                first_error.get_or_insert(e);
            }
        }

        self.locked = false;

        match first_error {
            Some(e) => Err(e),
            None => Ok(true),
        }
    }

    fn is_locked(&self) -> bool {
        self.locked
    }
}

impl<S: Store + ?Sized> std::fmt::Debug for MultiKeyLock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiKeyLock")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .field("locked", &self.locked)
            .finish()
    }
}
