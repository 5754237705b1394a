// Shared helpers for docstore-store integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use docstore_store::{
    Connector, DocStoreError, DocumentStore, PoolSettings, Result, RetryPolicy, SqliteConnector,
    StoreConfig,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

pub const TABLE_PREFIX: &str = "t_";

/// Millisecond-scale backoff so retry tests finish quickly
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_delay_ms: 10,
        step_ms: 10,
        max_delay_ms: 50,
    }
}

pub fn dsn_for(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

/// Config for a database file inside `dir`, with a small pool
pub fn test_config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dsn_for(&dir.path().join("docs.db")), TABLE_PREFIX)
        .with_pool(PoolSettings {
            max_open: 8,
            max_idle: 2,
        })
        .with_retry(fast_retry())
        .with_busy_timeout_ms(10_000)
}

/// Open a store on a fresh scratch database
///
/// The `TempDir` must outlive the store.
pub fn open_store() -> (TempDir, DocumentStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = DocumentStore::open(test_config(&dir)).expect("Failed to open store");
    (dir, store)
}

/// Connector that fails a fixed number of times before delegating
pub struct FlakyConnector {
    inner: SqliteConnector,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl FlakyConnector {
    pub fn new(config: &StoreConfig, failures: u32) -> Self {
        Self {
            inner: SqliteConnector::from_config(config).expect("valid test config"),
            failures_left: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    /// Total calls to `connect`, failed or not
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FlakyConnector {
    async fn connect(&self) -> Result<SqlitePool> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(DocStoreError::ConnectionUnavailable {
                message: "connection refused".to_string(),
            });
        }
        self.inner.connect().await
    }

    fn target(&self) -> String {
        "flaky-test-backend".to_string()
    }
}

/// Number of tables with the given name in the scratch database
pub async fn table_count(store: &DocumentStore, table: &str) -> i64 {
    let pool = store.connections().acquire().await;
    sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
        .bind(table)
        .fetch_one(pool)
        .await
        .expect("sqlite_master query")
}

/// Number of rows in a collection's table
pub async fn row_count(store: &DocumentStore, collection: &str) -> i64 {
    let stmt = format!("SELECT COUNT(*) FROM `{}`", store.table_name(collection));
    let pool = store.connections().acquire().await;
    sqlx::query_scalar(&stmt)
        .fetch_one(pool)
        .await
        .expect("row count query")
}
