//! Exit code constants for the redis-exclusive worker binary.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Configuration error
//! - 3: Store failure (connection, protocol, unsupported command)
//! - 4: Lock acquisition failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or an operation refused without `--force`.
pub const USER_ERROR: i32 = 1;

/// Configuration error: unreadable or invalid config file or environment.
pub const CONFIG_FAILURE: i32 = 2;

/// Store failure: the store could not be reached or rejected a command.
pub const STORE_FAILURE: i32 = 3;

/// Lock acquisition failure: the lock is held by another owner.
pub const LOCK_FAILURE: i32 = 4;
