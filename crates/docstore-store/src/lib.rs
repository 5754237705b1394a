//! docstore store - JSON documents over SQLite
//!
//! Provides:
//! - Lazily opened, retried connection pool (`db`)
//! - Per-collection table registry with idempotent creation (`registry`)
//! - `DocumentStore`: read, write, change-detecting write and key listing
//! - Structured key filters and the raw-SQL listing escape hatch
//! - Best-effort post-write observers (`hook`)

pub mod config;
pub mod db;
pub mod errors;
pub mod filter;
pub mod hook;
pub mod registry;
mod sql;
pub mod store;

// Re-export key types
pub use config::{PoolSettings, RetryPolicy, StoreConfig};
pub use db::{ConnectionManager, Connector, SqliteConnector};
pub use docstore_core::core_types::{DocumentMeta, WriteOutcome};
pub use docstore_core::errors::DocStoreError;
pub use errors::Result;
pub use filter::KeyFilter;
pub use hook::{WriteEvent, WriteMode, WriteObserver};
pub use registry::{CollectionRegistry, TableState};
pub use store::DocumentStore;
