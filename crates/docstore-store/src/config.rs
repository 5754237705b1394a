//! Store configuration
//!
//! Configuration is a plain struct. Callers may build it in code with
//! `StoreConfig::new(dsn, prefix)` and the `with_*` helpers, or deserialize
//! it (e.g. from TOML via `StoreConfig::from_toml_str`). Loading files or
//! environment variables is left to the embedding application.

use docstore_core::errors::{DocStoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection pool limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of open connections
    pub max_open: u32,
    /// Connections kept open while idle
    pub max_idle: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_open: 100,
            max_idle: 10,
        }
    }
}

/// Backoff schedule for the connection retry loop
///
/// The delay after the n-th consecutive failure (1-based) is
/// `min(initial + step * (n - 1), max)`: linear growth, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub step_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            step_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let steps = u64::from(attempt.saturating_sub(1));
        let ms = self
            .initial_delay_ms
            .saturating_add(self.step_ms.saturating_mul(steps))
            .min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Configuration for a `DocumentStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend connection string, e.g. `sqlite://data/docs.db`
    pub dsn: String,
    /// Prepended to every collection name to form its table name
    #[serde(default)]
    pub table_prefix: String,
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub retry: RetryPolicy,
    /// How long a statement waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl StoreConfig {
    pub fn new(dsn: impl Into<String>, table_prefix: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            table_prefix: table_prefix.into(),
            pool: PoolSettings::default(),
            retry: RetryPolicy::default(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_busy_timeout_ms(mut self, busy_timeout_ms: u64) -> Self {
        self.busy_timeout_ms = busy_timeout_ms;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidConfig` if the text does not parse or
    /// the result fails `validate`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(text).map_err(|e| DocStoreError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings for values the pool or retry loop cannot honor
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidConfig` naming the first bad setting.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(DocStoreError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        if self.dsn.trim().is_empty() {
            return invalid("dsn must not be empty");
        }
        if self.pool.max_open == 0 {
            return invalid("pool.max_open must be at least 1");
        }
        if self.pool.max_idle > self.pool.max_open {
            return invalid("pool.max_idle must not exceed pool.max_open");
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return invalid("retry.initial_delay_ms must not exceed retry.max_delay_ms");
        }
        Ok(())
    }
}
