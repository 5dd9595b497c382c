//! Nested configuration sections and defaults.

use serde::{Deserialize, Serialize};

/// Fixed-interval polling policy for `acquire_with_retry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Give up after this many milliseconds (default: 3000).
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,

    /// Pause between attempts in milliseconds (default: 100).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_wait_ms: default_max_wait_ms(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Redis connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Logical database locks are created in (0-15).
    #[serde(default)]
    pub database: u32,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            database: 0,
        }
    }
}

// Default value functions for serde
pub(crate) fn default_prefix() -> String {
    crate::factory::DEFAULT_PREFIX.to_string()
}
pub(crate) fn default_ttl_ms() -> u64 {
    10_000
}
pub(crate) fn default_max_wait_ms() -> u64 {
    3000
}
pub(crate) fn default_backoff_ms() -> u64 {
    100
}
pub(crate) fn default_host() -> String {
    "127.0.0.1".to_string()
}
pub(crate) fn default_port() -> u16 {
    6379
}
