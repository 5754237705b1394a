//! Document store
//!
//! The public surface: one table per collection, documents addressed by
//! string key, payloads stored as JSON next to a content digest. Every
//! operation first makes sure the collection's table exists (see
//! [`CollectionRegistry`]), then borrows the shared pool (see
//! [`ConnectionManager`]) for a single statement.
//!
//! Operations wait, without erroring, while the backend is unreachable on
//! first use. See the `db` module.

use crate::config::StoreConfig;
use crate::db::{ConnectionManager, Connector, SqliteConnector};
use crate::errors::{document_not_found, from_sqlx, Result};
use crate::filter::KeyFilter;
use crate::hook::{self, WriteEvent, WriteMode, WriteObserver};
use crate::registry::CollectionRegistry;
use crate::sql;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use docstore_core::core_types::{DocumentMeta, WriteOutcome, MAX_KEY_BYTES};
use docstore_core::digest::EncodedDocument;
use docstore_core::errors::DocStoreError;
use docstore_core::{log_op_end, log_op_error, log_op_start};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::Row;
use std::sync::Arc;
use std::time::Instant;

/// JSON document store over a SQLite connection pool
///
/// Cheap to share: wrap it in an `Arc` and call it from any number of tasks.
pub struct DocumentStore {
    config: StoreConfig,
    connections: ConnectionManager,
    registry: CollectionRegistry,
    observer: Option<Arc<dyn WriteObserver>>,
}

impl DocumentStore {
    /// Create a store for the configured SQLite database.
    ///
    /// No connection is made here; the pool is opened by the first
    /// operation that needs it.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidConfig` if the configuration or DSN is
    /// invalid.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let connector = SqliteConnector::from_config(&config)?;
        Ok(Self::with_connector(config, Arc::new(connector)))
    }

    /// Create a store that opens its pool through a custom connector
    pub fn with_connector(config: StoreConfig, connector: Arc<dyn Connector>) -> Self {
        let connections = ConnectionManager::new(connector, config.retry);
        let registry = CollectionRegistry::new(config.table_prefix.clone());
        Self {
            config,
            connections,
            registry,
            observer: None,
        }
    }

    /// Register the post-write observer. Replaces any previous one.
    pub fn with_observer(mut self, observer: Arc<dyn WriteObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The connection manager, for issuing statements the store does not cover
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Backing table name for a collection
    pub fn table_name(&self, collection: &str) -> String {
        self.registry.table_name(collection)
    }

    /// Create the collection's table if this process has not verified it yet.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::TableCreationFailed` if the backend rejects
    /// the create statement.
    pub async fn ensure_table(&self, collection: &str) -> Result<()> {
        let start = Instant::now();
        log_op_start!("ensure_table", collection = collection);
        let result = self.registry.ensure_table(&self.connections, collection).await;
        finish("ensure_table", collection, None, start, result)
    }

    /// Read the stored JSON payload of a document.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidKey` for an empty or over-long key,
    /// `DocumentNotFound` if there is no row for the key or its payload is
    /// NULL, `TableCreationFailed` on first use of a bad collection name,
    /// and `Backend` for other backend failures.
    pub async fn read_raw(&self, collection: &str, key: &str) -> Result<Vec<u8>> {
        let start = Instant::now();
        log_op_start!("read_raw", collection = collection, key = key);
        let result = self.fetch_payload(collection, key).await;
        finish("read_raw", collection, Some(key), start, result)
    }

    /// Read a document and decode it into `T`.
    ///
    /// # Errors
    ///
    /// As `read_raw`, plus `DocStoreError::SerializationFailed` if the
    /// payload does not decode into `T`.
    pub async fn read<T: DeserializeOwned>(&self, collection: &str, key: &str) -> Result<T> {
        let start = Instant::now();
        log_op_start!("read", collection = collection, key = key);
        let result = match self.fetch_payload(collection, key).await {
            Ok(raw) => serde_json::from_slice(&raw).map_err(DocStoreError::from),
            Err(err) => Err(err),
        };
        finish("read", collection, Some(key), start, result)
    }

    /// Read a document's row metadata (digest and timestamps).
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidKey` for an empty or over-long key,
    /// `DocumentNotFound` if there is no row for the key, and `Backend` if a
    /// stored timestamp cannot be parsed.
    pub async fn stat(&self, collection: &str, key: &str) -> Result<DocumentMeta> {
        let start = Instant::now();
        log_op_start!("stat", collection = collection, key = key);
        let result = self.fetch_meta(collection, key).await;
        finish("stat", collection, Some(key), start, result)
    }

    /// Store a document, overwriting any existing row for the key.
    ///
    /// The payload is encoded as tab-indented JSON and digested together
    /// with the key. After the statement succeeds the observer, if any, is
    /// notified.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::InvalidKey` for an empty or over-long key,
    /// `SerializationFailed` if the value cannot be encoded, and
    /// `BackendConstraintViolation` if the digest is already owned by a
    /// different key.
    pub async fn write<T>(&self, collection: &str, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let start = Instant::now();
        log_op_start!("write", collection = collection, key = key);
        let result = self
            .execute_write(collection, key, value, WriteMode::Overwrite)
            .await
            .map(|_| ());
        finish("write", collection, Some(key), start, result)
    }

    /// Store a document only if its content differs from what is stored.
    ///
    /// A new key is inserted. An existing key is rewritten only when its
    /// stored digest differs; an identical payload leaves the row (and its
    /// `update_time`) untouched and yields `WriteOutcome::Unchanged`.
    ///
    /// A write whose digest is already owned by a *different* key is
    /// silently ignored as well, whether it would insert a new key or
    /// rewrite an existing one: only the first writer of that digest
    /// persists. Since the digest covers the key this needs a 64-bit hash
    /// collision, but it is never detected.
    ///
    /// The observer is notified after every successful call, including
    /// `Unchanged` ones.
    ///
    /// # Errors
    ///
    /// As `write`, except digest conflicts are not reported.
    pub async fn write_if_changed<T>(
        &self,
        collection: &str,
        key: &str,
        value: &T,
    ) -> Result<WriteOutcome>
    where
        T: Serialize + Sync + ?Sized,
    {
        let start = Instant::now();
        log_op_start!("write_if_changed", collection = collection, key = key);
        let result = self
            .execute_write(collection, key, value, WriteMode::IfChanged)
            .await;
        if let Ok(outcome) = &result {
            tracing::debug!(
                component = module_path!(),
                op = "write_if_changed",
                collection = collection,
                key = key,
                outcome = outcome.as_str(),
            );
        }
        finish("write_if_changed", collection, Some(key), start, result)
    }

    /// All keys in a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `TableCreationFailed` on first use of a bad collection name
    /// and `Backend` for other backend failures.
    pub async fn list_keys(&self, collection: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        log_op_start!("list_keys", collection = collection);
        let result = self
            .fetch_keys(collection, sql::select_keys, &[])
            .await;
        finish("list_keys", collection, None, start, result)
    }

    /// Keys of documents matching a raw SQL condition.
    ///
    /// # Security
    ///
    /// `raw_condition` is pasted verbatim after `WHERE`. It is not escaped,
    /// validated or parameterized, so it must never contain untrusted input.
    /// The payload column is `j` and the key column is `id`. Prefer
    /// [`DocumentStore::list_keys_filtered`] where it is expressive enough.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the resulting statement is rejected.
    pub async fn list_keys_where_sql(
        &self,
        collection: &str,
        raw_condition: &str,
    ) -> Result<Vec<String>> {
        let start = Instant::now();
        log_op_start!("list_keys_where_sql", collection = collection);
        let result = self
            .fetch_keys(
                collection,
                |table| sql::select_keys_where_raw(table, raw_condition),
                &[],
            )
            .await;
        finish("list_keys_where_sql", collection, None, start, result)
    }

    /// Keys of documents matching a structured filter, with every value bound.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the backend rejects the query (e.g. a malformed
    /// JSON path).
    pub async fn list_keys_filtered(
        &self,
        collection: &str,
        filter: &KeyFilter,
    ) -> Result<Vec<String>> {
        let start = Instant::now();
        log_op_start!("list_keys_filtered", collection = collection);
        let table = self.table_name(collection);
        let (stmt, binds) = filter.to_query(&table);
        let result = self.fetch_keys(collection, |_| stmt.clone(), &binds).await;
        finish("list_keys_filtered", collection, None, start, result)
    }

    async fn fetch_payload(&self, collection: &str, key: &str) -> Result<Vec<u8>> {
        validate_key(key)?;
        self.registry
            .ensure_table(&self.connections, collection)
            .await?;

        let stmt = sql::select_payload(&self.table_name(collection));
        let pool = self.connections.acquire().await;
        let row = sqlx::query(&stmt)
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|e| from_sqlx(collection, e))?;

        let payload: Option<String> = match row {
            Some(row) => row.try_get("j").map_err(|e| from_sqlx(collection, e))?,
            None => None,
        };

        payload
            .map(String::into_bytes)
            .ok_or_else(|| document_not_found(collection, key))
    }

    async fn fetch_meta(&self, collection: &str, key: &str) -> Result<DocumentMeta> {
        validate_key(key)?;
        self.registry
            .ensure_table(&self.connections, collection)
            .await?;

        let stmt = sql::select_meta(&self.table_name(collection));
        let pool = self.connections.acquire().await;
        let row = sqlx::query(&stmt)
            .bind(key)
            .fetch_optional(pool)
            .await
            .map_err(|e| from_sqlx(collection, e))?
            .ok_or_else(|| document_not_found(collection, key))?;

        let id: String = row.try_get("id").map_err(|e| from_sqlx(collection, e))?;
        let xxh: Option<i64> = row.try_get("xxh").map_err(|e| from_sqlx(collection, e))?;
        let create_time: i64 = row
            .try_get("create_time")
            .map_err(|e| from_sqlx(collection, e))?;
        let update_time: String = row
            .try_get("update_time")
            .map_err(|e| from_sqlx(collection, e))?;

        Ok(DocumentMeta {
            key: id,
            digest: xxh.unwrap_or_default() as u64,
            create_time: DateTime::from_timestamp(create_time, 0).ok_or_else(|| {
                DocStoreError::Backend {
                    message: format!("create_time out of range: {}", create_time),
                }
            })?,
            update_time: parse_update_time(&update_time)?,
        })
    }

    async fn execute_write<T>(
        &self,
        collection: &str,
        key: &str,
        value: &T,
        mode: WriteMode,
    ) -> Result<WriteOutcome>
    where
        T: Serialize + Sync + ?Sized,
    {
        validate_key(key)?;
        self.registry
            .ensure_table(&self.connections, collection)
            .await?;

        let doc = EncodedDocument::new(key, value)?;
        let table = self.table_name(collection);
        let stmt = match mode {
            WriteMode::Overwrite => sql::upsert(&table),
            WriteMode::IfChanged => sql::insert_if_changed(&table),
        };

        let pool = self.connections.acquire().await;
        let executed = sqlx::query(&stmt)
            .bind(key)
            .bind(doc.as_str())
            .bind(doc.digest_as_i64())
            .execute(pool)
            .await;

        let rows_affected = match executed {
            Ok(done) => done.rows_affected(),
            Err(err) => match (mode, from_sqlx(collection, err)) {
                // OR IGNORE does not reach the DO UPDATE branch; the only
                // unique index left there is `xxh`
                (WriteMode::IfChanged, DocStoreError::BackendConstraintViolation { message, .. }) => {
                    tracing::debug!(
                        component = module_path!(),
                        op = "write_if_changed",
                        collection = collection,
                        key = key,
                        reason = %message,
                        "Digest owned by another key; write ignored"
                    );
                    0
                }
                (_, err) => return Err(err),
            },
        };

        let outcome = match mode {
            WriteMode::Overwrite => WriteOutcome::Written,
            WriteMode::IfChanged if rows_affected == 0 => WriteOutcome::Unchanged,
            WriteMode::IfChanged => WriteOutcome::Written,
        };

        if let Some(observer) = &self.observer {
            self.notify_observer(observer.as_ref(), collection, key, &doc, mode, outcome);
        }

        Ok(outcome)
    }

    fn notify_observer(
        &self,
        observer: &dyn WriteObserver,
        collection: &str,
        key: &str,
        doc: &EncodedDocument,
        mode: WriteMode,
        outcome: WriteOutcome,
    ) {
        let value = match serde_json::from_slice(&doc.bytes) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(
                    component = module_path!(),
                    op = "after_write",
                    collection = collection,
                    key = key,
                    error = %err,
                    "Could not decode written payload for observer"
                );
                return;
            }
        };

        let event = WriteEvent {
            collection: collection.to_string(),
            key: key.to_string(),
            value,
            digest: doc.digest,
            mode,
            outcome,
        };
        hook::notify(observer, &event);
    }

    async fn fetch_keys<F>(&self, collection: &str, build: F, binds: &[String]) -> Result<Vec<String>>
    where
        F: FnOnce(&str) -> String,
    {
        self.registry
            .ensure_table(&self.connections, collection)
            .await?;

        let stmt = build(&self.table_name(collection));
        let mut query = sqlx::query(&stmt);
        for value in binds {
            query = query.bind(value.as_str());
        }

        let pool = self.connections.acquire().await;
        let rows = query
            .fetch_all(pool)
            .await
            .map_err(|e| from_sqlx(collection, e))?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| from_sqlx(collection, e))
    }
}

/// Log the end of a public operation and hand its result back
fn finish<T>(
    op: &'static str,
    collection: &str,
    key: Option<&str>,
    start: Instant,
    result: Result<T>,
) -> Result<T> {
    let duration_ms = start.elapsed().as_millis() as u64;
    let key = key.unwrap_or_default();
    match &result {
        Ok(_) => {
            log_op_end!(op, duration_ms = duration_ms, collection = collection, key = key);
        }
        Err(err) => {
            log_op_error!(
                op,
                err.clone(),
                duration_ms = duration_ms,
                collection = collection,
                key = key
            );
        }
    }
    result
}

fn validate_key(key: &str) -> Result<()> {
    let reason = if key.is_empty() {
        "key must not be empty".to_string()
    } else if key.len() > MAX_KEY_BYTES {
        format!("key is {} bytes, limit is {}", key.len(), MAX_KEY_BYTES)
    } else {
        return Ok(());
    };
    Err(DocStoreError::InvalidKey {
        key: key.to_string(),
        reason,
    })
}

fn parse_update_time(text: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, sql::UPDATE_TIME_FORMAT).map_err(|e| {
        DocStoreError::Backend {
            message: format!("unparseable update_time {:?}: {}", text, e),
        }
    })?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_limits() {
        assert!(validate_key("item-42").is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_BYTES)).is_ok());
        assert!(matches!(
            validate_key(""),
            Err(DocStoreError::InvalidKey { .. })
        ));
        assert!(matches!(
            validate_key(&"k".repeat(MAX_KEY_BYTES + 1)),
            Err(DocStoreError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_parse_update_time_with_millis() {
        let parsed = parse_update_time("2026-10-17 08:30:05.123").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 123);
        assert_eq!(parsed.timestamp() % 60, 5);
    }

    #[test]
    fn test_parse_update_time_rejects_garbage() {
        assert!(parse_update_time("yesterday").is_err());
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = StoreConfig::new("", "t_");
        assert!(matches!(
            DocumentStore::open(config),
            Err(DocStoreError::InvalidConfig { .. })
        ));
    }
}
