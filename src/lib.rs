//! Distributed mutual-exclusion locks backed by a Redis-compatible store.
//!
//! Processes that share nothing but a store coordinate exclusive access to
//! named resources. The store's atomic primitives are the only source of
//! truth: a conditional write takes a lock, a compare-and-delete script
//! releases it, and a TTL frees it if the holder disappears.
//!
//! ```no_run
//! use redis_exclusive::{Lock, LockFactory, RedisStore};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> redis_exclusive::Result<()> {
//! let store = Arc::new(RedisStore::open("redis://127.0.0.1:6379/")?);
//! let factory = LockFactory::with_defaults(Arc::clone(&store));
//!
//! let mut lock = factory.lock("invoice:42", Duration::from_secs(10), "worker-a")?;
//! if lock.acquire_with_retry(Duration::from_secs(3), Duration::from_millis(100))? {
//!     // critical section
//!     lock.release()?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod factory;
pub mod locks;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{ExclusiveError, Result};
pub use factory::LockFactory;
pub use locks::{
    Lock, MultiKeyLock, SingleKeyLock, TransactionResult, TransactionalLock, owner_token,
};
pub use store::{MemoryStore, RedisStore, SetOptions, Store};
