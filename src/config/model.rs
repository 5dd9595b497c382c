//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};

/// Configuration for redis-exclusive.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Prefix applied to every lock key (default: "lock:").
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Lock time-to-live in milliseconds when none is given (default: 10000).
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,

    /// Polling policy for retrying acquisitions.
    #[serde(default)]
    pub retry: RetrySettings,

    // =========================================================================
    // Store settings
    // =========================================================================
    /// Redis connection parameters.
    #[serde(default)]
    pub redis: RedisSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            default_ttl_ms: default_ttl_ms(),
            retry: RetrySettings::default(),
            redis: RedisSettings::default(),
        }
    }
}
