//! Database connection management
//!
//! The store talks to its backend through one shared `sqlx` pool owned by a
//! [`ConnectionManager`]. The pool is opened lazily by the first caller and
//! memoized for the rest of the process. Opening is retried forever with a
//! linear, capped backoff ([`RetryPolicy`]); a caller that triggers (or waits
//! on) the first connection therefore blocks for as long as the backend is
//! unreachable. Callers on latency-sensitive paths should wrap store calls in
//! their own `tokio::time::timeout`.

use crate::config::{PoolSettings, RetryPolicy, StoreConfig};
use crate::errors::{connection_unavailable, Result};
use async_trait::async_trait;
use docstore_core::errors::DocStoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Opens a connection pool to the backend
///
/// One call is one attempt; retrying is the `ConnectionManager`'s job.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Make a single attempt to open a pool.
    async fn connect(&self) -> Result<SqlitePool>;

    /// Human-readable target for log messages. Must not include credentials.
    fn target(&self) -> String {
        "backend".to_string()
    }
}

/// Connector for a SQLite database file
pub struct SqliteConnector {
    options: SqliteConnectOptions,
    pool: PoolSettings,
    target: String,
}

impl SqliteConnector {
    /// Build a connector from the store configuration
    ///
    /// Only parses the DSN; no I/O happens until `connect`.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidConfig` if the DSN is not a valid
    /// SQLite connection string.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.dsn)
            .map_err(|e| DocStoreError::InvalidConfig {
                reason: format!("invalid dsn: {}", e),
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout());

        Ok(Self {
            options,
            pool: config.pool,
            target: config.dsn.clone(),
        })
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self) -> Result<SqlitePool> {
        SqlitePoolOptions::new()
            .max_connections(self.pool.max_open)
            .min_connections(self.pool.max_idle)
            .connect_with(self.options.clone())
            .await
            .map_err(connection_unavailable)
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}

/// Lazily established, process-lifetime connection pool
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    retry: RetryPolicy,
    pool: OnceCell<SqlitePool>,
    failed_attempts: AtomicU64,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, retry: RetryPolicy) -> Self {
        Self {
            connector,
            retry,
            pool: OnceCell::new(),
            failed_attempts: AtomicU64::new(0),
        }
    }

    /// Get the shared pool, opening it first if needed.
    ///
    /// Never fails. The first callers wait until the backend accepts a
    /// connection, however long that takes; only one of them runs the
    /// connect/retry loop while the rest wait for its result. Once the pool
    /// exists this returns without taking any lock.
    pub async fn acquire(&self) -> &SqlitePool {
        if let Some(pool) = self.pool.get() {
            return pool;
        }
        self.pool.get_or_init(|| self.connect_with_retry()).await
    }

    /// The pool, if it has already been established
    pub fn try_get(&self) -> Option<&SqlitePool> {
        self.pool.get()
    }

    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    /// Failed connection attempts since this manager was created
    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn connect_with_retry(&self) -> SqlitePool {
        let target = self.connector.target();
        let mut attempt: u32 = 0;
        loop {
            match self.connector.connect().await {
                Ok(pool) => {
                    tracing::info!(
                        component = module_path!(),
                        op = "connect",
                        backend = %target,
                        failed_attempts = attempt,
                        "Connected to backend"
                    );
                    return pool;
                }
                Err(err) => {
                    attempt = attempt.saturating_add(1);
                    self.failed_attempts.fetch_add(1, Ordering::Relaxed);
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        component = module_path!(),
                        op = "connect",
                        backend = %target,
                        attempt = attempt,
                        retry_after_ms = delay.as_millis() as u64,
                        "{}. Retry after {:.1} seconds",
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
