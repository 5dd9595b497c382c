//! Configuration model for redis-exclusive.
//!
//! This module defines the Config struct loaded from a YAML file (for example
//! `redis-exclusive.yaml`). It supports forward-compatible YAML parsing
//! (unknown fields are ignored), sensible defaults for every field,
//! `REDIS_EXCLUSIVE_*` environment overrides and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use types::{RedisSettings, RetrySettings};
