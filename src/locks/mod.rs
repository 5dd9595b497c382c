//! Locking subsystem for redis-exclusive.
//!
//! This module implements the lock model on top of [`Store`](crate::store::Store):
//! - [`SingleKeyLock`] over exactly one namespaced key
//! - [`MultiKeyLock`] over a set of keys, all-or-nothing
//! - [`TransactionalLock`] coupling a held lock to a buffered transaction
//!
//! # Lock Keys
//!
//! A lock is one store entry: key = `prefix + logical key`, value = owner
//! token, expiry = the lock TTL in milliseconds. It is created with an
//! only-if-absent write so that of several concurrent acquirers exactly one
//! succeeds, and removed by an atomic compare-and-delete so that only the
//! owner whose token is still stored can release it.
//!
//! # Cached State
//!
//! `is_locked()` reports what this instance last observed. When the TTL runs
//! out in the store the instance keeps reporting `true` until it calls
//! `release()`, which then returns `false`. Nothing re-queries the store.
//!
//! # Ordering
//!
//! [`MultiKeyLock`] sorts its keys by byte order before acquiring. Every
//! acquirer in the same namespace therefore takes overlapping keys in the
//! same sequence, which rules out circular waits.
//!
//! # RAII Guards
//!
//! Scoped forms (`acquire_with`, `with_transaction`) release through guard
//! objects that run on drop, so the lock is released exactly once whether the
//! callback returns, fails, or panics. A release failure inside a drop is
//! logged, not raised.

mod guard;
mod multi;
mod owner;
mod single;
mod transactional;
mod types;


// Re-export public API
pub use guard::{ReleaseGuard, TransactionGuard};
pub use multi::MultiKeyLock;
pub use owner::owner_token;
pub use single::SingleKeyLock;
pub use transactional::TransactionalLock;
pub use types::{DEFAULT_BACKOFF, DEFAULT_MAX_WAIT, Lock, TransactionResult};
