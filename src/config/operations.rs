//! Config loading, overrides, validation, and utility operations.

use super::model::Config;
use crate::error::{ExclusiveError, Result};
use crate::store::DATABASE_COUNT;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

impl Config {
    /// Load config from a YAML file, then apply environment overrides.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML config file
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(ExclusiveError::Config)` - Read/parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExclusiveError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config = Self::parse_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| ExclusiveError::Config(format!("failed to parse config YAML: {}", e)))
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            ExclusiveError::Config(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Apply `REDIS_EXCLUSIVE_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up by variable name.
    ///
    /// Each setting reads its `REDIS_EXCLUSIVE_*` variable first and, for
    /// connection settings, falls back to the generic `REDIS_*` one.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| names.iter().find_map(|name| lookup(name));

        if let Some(prefix) = first(&["REDIS_EXCLUSIVE_PREFIX"]) {
            self.prefix = prefix;
        }
        if let Some(ttl) = first(&["REDIS_EXCLUSIVE_DEFAULT_TTL"]) {
            self.default_ttl_ms = parse_var("REDIS_EXCLUSIVE_DEFAULT_TTL", &ttl)?;
        }
        if let Some(host) = first(&["REDIS_EXCLUSIVE_HOST", "REDIS_HOST"]) {
            self.redis.host = host;
        }
        if let Some(port) = first(&["REDIS_EXCLUSIVE_PORT", "REDIS_PORT"]) {
            self.redis.port = parse_var("REDIS_EXCLUSIVE_PORT", &port)?;
        }
        if let Some(password) = first(&["REDIS_EXCLUSIVE_PASSWORD", "REDIS_PASSWORD"]) {
            self.redis.password = Some(password).filter(|p| !p.is_empty());
        }
        if let Some(database) = first(&["REDIS_EXCLUSIVE_DATABASE", "REDIS_DB"]) {
            self.redis.database = parse_var("REDIS_EXCLUSIVE_DATABASE", &database)?;
        }

        Ok(())
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `prefix` must be non-empty
    /// - `default_ttl_ms` and `retry.backoff_ms` must be positive
    /// - `redis.database` must be in 0..=15
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(ExclusiveError::Config(
                "config validation failed: prefix must not be empty".to_string(),
            ));
        }

        if self.default_ttl_ms == 0 {
            return Err(ExclusiveError::Config(
                "config validation failed: default_ttl_ms must be greater than 0".to_string(),
            ));
        }

        if self.retry.backoff_ms == 0 {
            return Err(ExclusiveError::Config(
                "config validation failed: retry.backoff_ms must be greater than 0".to_string(),
            ));
        }

        if self.redis.database >= DATABASE_COUNT {
            return Err(ExclusiveError::Config(format!(
                "config validation failed: redis.database must be between 0 and {} (found {})",
                DATABASE_COUNT - 1,
                self.redis.database
            )));
        }

        Ok(())
    }

    /// Connection URL for the configured server.
    ///
    /// The password is percent-encoded, so characters such as `@`, `:` or
    /// `/` survive the round-trip through the redis client's URL parser.
    pub fn redis_url(&self) -> Result<String> {
        let mut url = Url::parse(&format!("redis://{}:{}/", self.redis.host, self.redis.port))
            .map_err(|e| {
                ExclusiveError::Config(format!(
                    "invalid redis host '{}': {}",
                    self.redis.host, e
                ))
            })?;

        if let Some(password) = &self.redis.password {
            url.set_password(Some(password)).map_err(|()| {
                ExclusiveError::Config("redis URL cannot carry a password".to_string())
            })?;
        }

        Ok(url.into())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.retry.max_wait_ms)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry.backoff_ms)
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        ExclusiveError::Config(format!("invalid value for {}: '{}'", name, value))
    })
}
