//! Error types for redis-exclusive.
//!
//! Contention is not an error: a lock that is already held makes `acquire`
//! return `Ok(false)`. Everything here is either fatal for the current call
//! or a failure of the store itself.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for lock, store and configuration operations.
#[derive(Error, Debug)]
pub enum ExclusiveError {
    /// The upfront acquire of a transactional block failed.
    #[error("{0}")]
    LockAcquisition(String),

    /// A store command reached an option adaptor that does not support it.
    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    /// The store could not be reached or returned an unexpected reply.
    #[error("Store operation failed: {0}")]
    Store(String),

    /// Configuration file or environment is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// User provided invalid arguments.
    #[error("{0}")]
    UserError(String),
}

impl ExclusiveError {
    /// Error raised when a transactional block cannot take its lock.
    pub fn lock_acquisition() -> Self {
        ExclusiveError::LockAcquisition("Failed to acquire lock".to_string())
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExclusiveError::LockAcquisition(_) => exit_codes::LOCK_FAILURE,
            ExclusiveError::UnsupportedCommand(_) => exit_codes::STORE_FAILURE,
            ExclusiveError::Store(_) => exit_codes::STORE_FAILURE,
            ExclusiveError::Config(_) => exit_codes::CONFIG_FAILURE,
            ExclusiveError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

impl From<redis::RedisError> for ExclusiveError {
    fn from(err: redis::RedisError) -> Self {
        ExclusiveError::Store(err.to_string())
    }
}

/// Result type alias for redis-exclusive operations.
pub type Result<T> = std::result::Result<T, ExclusiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_acquisition_error_has_correct_exit_code() {
        let err = ExclusiveError::lock_acquisition();
        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
    }

    #[test]
    fn store_errors_share_exit_code() {
        let err = ExclusiveError::Store("connection refused".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORE_FAILURE);

        let err = ExclusiveError::UnsupportedCommand("HSET".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORE_FAILURE);
    }

    #[test]
    fn config_error_has_correct_exit_code() {
        let err = ExclusiveError::Config("prefix must not be empty".to_string());
        assert_eq!(err.exit_code(), exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn error_messages_are_descriptive() {
        assert_eq!(
            ExclusiveError::lock_acquisition().to_string(),
            "Failed to acquire lock"
        );

        let err = ExclusiveError::UnsupportedCommand("HSET".to_string());
        assert_eq!(err.to_string(), "Unsupported command: HSET");
    }
}
