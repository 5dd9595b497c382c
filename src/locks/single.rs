//! Lock over a single namespaced key.

use super::types::Lock;
use crate::error::{ExclusiveError, Result};
use crate::store::{RELEASE_SCRIPT, SetOptions, Store};
use std::sync::Arc;
use std::time::Duration;

/// Exclusive lock on one store key.
///
/// Acquired with `SET key owner PX ttl NX` and released with an atomic
/// compare-and-delete on the owner token.
pub struct SingleKeyLock<S: Store + ?Sized> {
    client: Arc<S>,
    key: String,
    ttl: Duration,
    owner: String,
    database: Option<u32>,
    locked: bool,
}

impl<S: Store + ?Sized> SingleKeyLock<S> {
    /// Create a lock on the already-namespaced `key`.
    pub fn new(
        client: Arc<S>,
        key: impl Into<String>,
        ttl: Duration,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            client,
            key: key.into(),
            ttl,
            owner: owner.into(),
            database: None,
            locked: false,
        }
    }

    /// Bind the lock to a logical database, selected before each store
    /// round-trip. Without it the lock uses whatever database the client
    /// has selected.
    pub fn with_database(mut self, database: u32) -> Self {
        self.database = Some(database);
        self
    }

    /// The full store key, prefix included.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn database(&self) -> Option<u32> {
        self.database
    }

    fn select(&self) -> Result<()> {
        let Some(database) = self.database else {
            return Ok(());
        };

        if self.client.select(database)? {
            Ok(())
        } else {
            Err(ExclusiveError::Store(format!(
                "failed to select database {}",
                database
            )))
        }
    }

    fn ttl_millis(&self) -> Result<u64> {
        match u64::try_from(self.ttl.as_millis()) {
            Ok(0) | Err(_) => Err(ExclusiveError::Config(format!(
                "lock ttl for '{}' must be between 1ms and u64::MAX ms",
                self.key
            ))),
            Ok(ms) => Ok(ms),
        }
    }
}

impl<S: Store + ?Sized> Lock for SingleKeyLock<S> {
    fn acquire(&mut self) -> Result<bool> {
        let options = SetOptions::new()
            .expire_ms(self.ttl_millis()?)
            .only_if_absent();

        self.select()?;
        let acquired = self.client.set(&self.key, &self.owner, &options)?;
        if acquired {
            self.locked = true;
        }

        tracing::debug!(key = %self.key, owner = %self.owner, acquired, "acquire");
        Ok(acquired)
    }

    fn release(&mut self) -> Result<bool> {
        if !self.locked {
            return Ok(false);
        }

        let reply = self.select().and_then(|()| {
            self.client
                .eval(RELEASE_SCRIPT, &[self.key.as_str()], &[self.owner.as_str()])
        });
        self.locked = false;

        let released = reply?.as_int() == Some(1);
        tracing::debug!(key = %self.key, owner = %self.owner, released, "release");
        Ok(released)
    }

    fn is_locked(&self) -> bool {
        self.locked
    }
}

impl<S: Store + ?Sized> std::fmt::Debug for SingleKeyLock<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleKeyLock")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .field("owner", &self.owner)
            .field("database", &self.database)
            .field("locked", &self.locked)
            .finish()
    }
}
