//! Store contract for redis-exclusive.
//!
//! Every lock is built purely on the [`Store`] trait:
//! - conditional `set` (only-if-absent with a millisecond TTL) to acquire
//! - `eval` of an atomic compare-and-delete script to release
//! - `multi` / `exec` / `discard` for buffered transactions
//!
//! # Implementations
//!
//! - [`RedisStore`] talks to a Redis-compatible server over a blocking
//!   connection. Command options are shaped by an [`OptionDispatcher`].
//! - [`MemoryStore`] keeps the keyspace in process. It honours the same TTL,
//!   conditional-write and transaction semantics and evaluates scripts through
//!   registered handlers.
//!
//! Implementations take `&self` and must be `Send + Sync`. A store shared by
//! several threads serializes its own calls.

mod memory;
mod options;
mod redis_store;
mod reply;


pub use memory::{Keyspace, MemoryStore, ScriptHandler};
pub use options::{OptionAdaptor, OptionDispatcher, SetAdaptor, SetOptions};
pub use redis_store::RedisStore;
pub use reply::Reply;

use crate::error::Result;

/// Atomic compare-and-delete: removes `KEYS[1]` only while it still holds `ARGV[1]`.
///
/// Returns `1` when the key was deleted and `0` otherwise.
pub const RELEASE_SCRIPT: &str = r#"if redis.call('get', KEYS[1]) == ARGV[1] then
  return redis.call('del', KEYS[1])
else
  return 0
end"#;

/// Number of logical databases a store exposes.
pub const DATABASE_COUNT: u32 = 16;

/// Operations a lock backend must provide.
pub trait Store: Send + Sync {
    /// Switch the logical database used by subsequent commands.
    fn select(&self, database: u32) -> Result<bool>;

    /// Write `value` under `key`, honouring `options`.
    ///
    /// Returns `true` when the write took effect (or was queued inside a
    /// transaction) and `false` when a condition (`NX`/`XX`) prevented it.
    fn set(&self, key: &str, value: &str, options: &SetOptions) -> Result<bool>;

    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Delete `keys`, returning how many were actually removed.
    fn remove(&self, keys: &[&str]) -> Result<u64>;

    /// Run a server-side script atomically.
    fn eval(&self, script: &str, keys: &[&str], args: &[&str]) -> Result<Reply>;

    /// Begin a buffered transaction block.
    fn multi(&self) -> Result<()>;

    /// Apply every command queued since [`Store::multi`].
    fn exec(&self) -> Result<Vec<Reply>>;

    /// Drop every command queued since [`Store::multi`].
    fn discard(&self) -> Result<()>;
}
