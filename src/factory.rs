//! Lock factory binding a store, key prefix and logical database.

use crate::config::Config;
use crate::error::{ExclusiveError, Result};
use crate::locks::{MultiKeyLock, SingleKeyLock, TransactionalLock};
use crate::store::Store;
use std::sync::Arc;
use std::time::Duration;

/// Default key prefix for lock entries.
pub const DEFAULT_PREFIX: &str = "lock:";

/// Produces locks bound to one store, prefix and database.
///
/// A factory is an immutable value: [`LockFactory::switch_database`] returns
/// a new factory and leaves this one untouched.
pub struct LockFactory<S: Store + ?Sized> {
    client: Arc<S>,
    prefix: String,
    database: u32,
}

impl<S: Store + ?Sized> LockFactory<S> {
    pub fn new(client: Arc<S>, prefix: impl Into<String>, database: u32) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            database,
        }
    }

    /// Factory using the `lock:` prefix on database 0.
    pub fn with_defaults(client: Arc<S>) -> Self {
        Self::new(client, DEFAULT_PREFIX, 0)
    }

    /// Factory using the prefix and database from `config`.
    pub fn from_config(client: Arc<S>, config: &Config) -> Self {
        Self::new(client, config.prefix.clone(), config.redis.database)
    }

    /// Create a lock on `prefix + key`.
    pub fn lock(
        &self,
        key: &str,
        ttl: Duration,
        owner: impl Into<String>,
    ) -> Result<SingleKeyLock<S>> {
        self.select()?;
        Ok(SingleKeyLock::new(
            Arc::clone(&self.client),
            format!("{}{}", self.prefix, key),
            ttl,
            owner,
        )
        .with_database(self.database))
    }

    /// Create an all-or-nothing lock on `prefix + key` for each of `keys`.
    pub fn multi_lock<I, K>(
        &self,
        keys: I,
        ttl: Duration,
        owner: impl Into<String>,
    ) -> Result<MultiKeyLock<S>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.select()?;
        Ok(MultiKeyLock::new(
            Arc::clone(&self.client),
            keys,
            ttl,
            owner,
            &self.prefix,
        )
        .with_database(self.database))
    }

    /// Run `f` in a transaction while holding the lock on `key`.
    ///
    /// Fails with [`ExclusiveError::LockAcquisition`] if the lock is busy.
    pub fn transactional<T, E, F>(
        &self,
        key: &str,
        ttl: Duration,
        owner: impl Into<String>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<ExclusiveError>,
    {
        let lock = self.lock(key, ttl, owner)?;
        TransactionalLock::new(Arc::clone(&self.client), lock).with_transaction(f)
    }

    /// Run `f` in a transaction while holding the locks on all of `keys`.
    pub fn multi_transactional<I, K, T, E, F>(
        &self,
        keys: I,
        ttl: Duration,
        owner: impl Into<String>,
        f: F,
    ) -> std::result::Result<T, E>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<ExclusiveError>,
    {
        let lock = self.multi_lock(keys, ttl, owner)?;
        TransactionalLock::new(Arc::clone(&self.client), lock).with_transaction(f)
    }

    /// New factory bound to `database`, sharing the same client and prefix.
    ///
    /// Locks remember the database of the factory that made them, so locks
    /// from both factories can be interleaved on the shared client.
    pub fn switch_database(&self, database: u32) -> Self {
        Self::new(Arc::clone(&self.client), self.prefix.clone(), database)
    }

    pub fn database_number(&self) -> u32 {
        self.database
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The store this factory hands to its locks.
    pub fn client(&self) -> &Arc<S> {
        &self.client
    }

    fn select(&self) -> Result<()> {
        if self.client.select(self.database)? {
            Ok(())
        } else {
            Err(ExclusiveError::Store(format!(
                "failed to select database {}",
                self.database
            )))
        }
    }
}

impl<S: Store + ?Sized> Clone for LockFactory<S> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.client), self.prefix.clone(), self.database)
    }
}

impl<S: Store + ?Sized> std::fmt::Debug for LockFactory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockFactory")
            .field("prefix", &self.prefix)
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locks::Lock;
    use crate::store::{MemoryStore, SetOptions};
    use crate::test_support::{Call, RecordingStore};

    const TTL: Duration = Duration::from_secs(5);

    #[test]
    fn lock_prefixes_key() {
        let store = Arc::new(MemoryStore::new());
        let factory = LockFactory::new(Arc::clone(&store), "app:", 0);

        let mut lock = factory.lock("job-1", TTL, "owner").unwrap();
        assert_eq!(lock.key(), "app:job-1");
        assert!(lock.acquire().unwrap());
        assert_eq!(store.get("app:job-1").unwrap().as_deref(), Some("owner"));
    }

    #[test]
    fn distinct_owners_exclude_each_other() {
        let factory = LockFactory::with_defaults(Arc::new(MemoryStore::new()));

        let mut first = factory.lock("k", TTL, "o1").unwrap();
        let mut second = factory.lock("k", TTL, "o2").unwrap();

        assert!(first.acquire().unwrap());
        assert!(!second.acquire().unwrap());
        assert!(first.release().unwrap());
        assert!(second.acquire().unwrap());
    }

    #[test]
    fn lock_selects_bound_database() {
        let store = Arc::new(RecordingStore::new());
        let factory = LockFactory::new(Arc::clone(&store), "lock:", 3);

        let mut lock = factory.lock("k", TTL, "o1").unwrap();
        lock.acquire().unwrap();

        assert_eq!(
            store.calls(),
            vec![
                Call::Select(3),
                Call::Select(3),
                Call::Set("lock:k".to_string())
            ]
        );
        assert_eq!(store.inner().selected_database(), 3);
    }

    #[test]
    fn lock_release_survives_interleaved_factory() {
        let store = Arc::new(MemoryStore::new());
        let db0 = LockFactory::with_defaults(Arc::clone(&store));
        let db1 = db0.switch_database(1);

        let mut first = db0.lock("k", TTL, "o1").unwrap();
        assert!(first.acquire().unwrap());

        let mut other = db1.lock("other", TTL, "o2").unwrap();
        assert!(other.acquire().unwrap());
        assert_eq!(store.selected_database(), 1);

        assert!(first.release().unwrap());
        store.select(0).unwrap();
        assert_eq!(store.get("lock:k").unwrap(), None);

        assert!(other.release().unwrap());
        store.select(1).unwrap();
        assert_eq!(store.get("lock:other").unwrap(), None);
    }

    #[test]
    fn multi_lock_release_survives_interleaved_factory() {
        let store = Arc::new(MemoryStore::new());
        let db0 = LockFactory::with_defaults(Arc::clone(&store));
        let db2 = db0.switch_database(2);

        let mut first = db0.multi_lock(["a", "b"], TTL, "o1").unwrap();
        assert!(first.acquire().unwrap());

        let mut other = db2.lock("a", TTL, "o2").unwrap();
        assert!(other.acquire().unwrap());

        assert!(first.release().unwrap());
        store.select(0).unwrap();
        assert_eq!(store.get("lock:a").unwrap(), None);
        assert_eq!(store.get("lock:b").unwrap(), None);

        store.select(2).unwrap();
        assert_eq!(store.get("lock:a").unwrap().as_deref(), Some("o2"));
    }

    #[test]
    fn multi_lock_prefixes_and_sorts_keys() {
        let store = Arc::new(MemoryStore::new());
        let factory = LockFactory::with_defaults(Arc::clone(&store));

        let lock = factory.multi_lock(["z", "m", "a"], TTL, "o1").unwrap();
        assert_eq!(
            lock.keys().collect::<Vec<_>>(),
            vec!["lock:a", "lock:m", "lock:z"]
        );
    }

    #[test]
    fn switch_database_returns_new_factory() {
        let factory = LockFactory::with_defaults(Arc::new(MemoryStore::new()));
        let switched = factory.switch_database(5);

        assert_eq!(factory.database_number(), 0);
        assert_eq!(switched.database_number(), 5);
        assert_eq!(switched.prefix(), factory.prefix());
        assert!(Arc::ptr_eq(switched.client(), factory.client()));
    }

    #[test]
    fn locks_in_different_databases_do_not_collide() {
        let store = Arc::new(MemoryStore::new());
        let db0 = LockFactory::with_defaults(Arc::clone(&store));
        let db1 = db0.switch_database(1);

        let mut first = db0.lock("k", TTL, "o1").unwrap();
        assert!(first.acquire().unwrap());

        let mut second = db1.lock("k", TTL, "o2").unwrap();
        assert!(second.acquire().unwrap());
    }

    #[test]
    fn from_config_uses_prefix_and_database() {
        let mut config = Config::default();
        config.prefix = "cfg:".to_string();
        config.redis.database = 2;

        let factory = LockFactory::from_config(Arc::new(MemoryStore::new()), &config);
        assert_eq!(factory.prefix(), "cfg:");
        assert_eq!(factory.database_number(), 2);
    }

    #[test]
    fn transactional_commits_and_releases() {
        let store = Arc::new(MemoryStore::new());
        let factory = LockFactory::with_defaults(Arc::clone(&store));

        let value = factory
            .transactional("tx", TTL, "o1", || {
                store.set("key1", "v10", &SetOptions::new())?;
                Ok::<_, ExclusiveError>(7)
            })
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(store.get("key1").unwrap().as_deref(), Some("v10"));
        assert_eq!(store.get("lock:tx").unwrap(), None);
    }

    #[test]
    fn transactional_fails_when_key_is_held() {
        let store = Arc::new(MemoryStore::new());
        let factory = LockFactory::with_defaults(Arc::clone(&store));

        let mut holder = factory.lock("tx", TTL, "holder").unwrap();
        assert!(holder.acquire().unwrap());

        let err = factory
            .transactional("tx", TTL, "o1", || Ok::<_, ExclusiveError>(()))
            .unwrap_err();
        assert!(matches!(err, ExclusiveError::LockAcquisition(_)));
        assert_eq!(store.get("lock:tx").unwrap().as_deref(), Some("holder"));
    }

    #[test]
    fn multi_transactional_rolls_back_on_error() {
        let store = Arc::new(MemoryStore::new());
        store.set("key1", "v1", &SetOptions::new()).unwrap();
        let factory = LockFactory::with_defaults(Arc::clone(&store));

        let result = factory.multi_transactional(["b", "a"], TTL, "o1", || {
            store.set("key1", "v10", &SetOptions::new())?;
            Err::<(), _>(ExclusiveError::UserError("abort".to_string()))
        });

        assert!(matches!(result, Err(ExclusiveError::UserError(ref m)) if m == "abort"));
        assert_eq!(store.get("key1").unwrap().as_deref(), Some("v1"));
        assert_eq!(store.get("lock:a").unwrap(), None);
        assert_eq!(store.get("lock:b").unwrap(), None);
    }

    #[test]
    fn factory_accepts_trait_object_store() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let factory = LockFactory::with_defaults(Arc::clone(&store));

        let mut lock = factory.lock("dyn", TTL, "o1").unwrap();
        assert!(lock.acquire().unwrap());
        assert_eq!(store.get("lock:dyn").unwrap().as_deref(), Some("o1"));
    }
}
