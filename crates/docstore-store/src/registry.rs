//! Collection registry
//!
//! Process-wide record of which collections have a verified backing table.
//! Each collection moves `Unknown → Verifying → Verified`; `Verified` is
//! terminal for the life of the registry. A failed verification returns the
//! collection to `Unknown` so the next operation tries again.
//!
//! The check and the create statement are not atomic: several callers may
//! find the same collection unverified and all issue the create. That is
//! harmless because the statement is `CREATE TABLE IF NOT EXISTS`, so the
//! registry never locks across the statement, and callers working on
//! different collections never contend.

use crate::db::ConnectionManager;
use crate::errors::{table_creation_failed, Result};
use crate::sql;
use dashmap::DashMap;

/// Verification state of one collection's table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Unknown,
    /// A create statement is in flight
    Verifying,
    Verified,
}

pub struct CollectionRegistry {
    table_prefix: String,
    tables: DashMap<String, TableState>,
}

impl CollectionRegistry {
    pub fn new(table_prefix: impl Into<String>) -> Self {
        Self {
            table_prefix: table_prefix.into(),
            tables: DashMap::new(),
        }
    }

    /// Backing table for a collection: prefix + name, unescaped
    pub fn table_name(&self, collection: &str) -> String {
        format!("{}{}", self.table_prefix, collection)
    }

    pub fn state(&self, collection: &str) -> TableState {
        self.tables
            .get(collection)
            .map(|entry| *entry.value())
            .unwrap_or(TableState::Unknown)
    }

    pub fn is_verified(&self, collection: &str) -> bool {
        self.state(collection) == TableState::Verified
    }

    /// Names of all verified collections, sorted
    pub fn verified_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .iter()
            .filter(|entry| *entry.value() == TableState::Verified)
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Make sure the collection's table exists, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `DocStoreError::TableCreationFailed` if the backend rejects the
    /// create statement. Nothing is cached in that case.
    pub async fn ensure_table(
        &self,
        connections: &ConnectionManager,
        collection: &str,
    ) -> Result<()> {
        if self.is_verified(collection) {
            return Ok(());
        }

        // Never downgrades an entry another caller already verified
        self.tables
            .entry(collection.to_string())
            .or_insert(TableState::Verifying);

        let table = self.table_name(collection);
        let stmt = sql::create_table(&table);
        let pool = connections.acquire().await;

        match sqlx::query(&stmt).persistent(false).execute(pool).await {
            Ok(_) => {
                self.tables
                    .insert(collection.to_string(), TableState::Verified);
                tracing::debug!(
                    component = module_path!(),
                    op = "ensure_table",
                    collection = collection,
                    table = table.as_str(),
                    "Collection table verified"
                );
                Ok(())
            }
            Err(err) => {
                self.tables
                    .remove_if(collection, |_, state| *state == TableState::Verifying);
                Err(table_creation_failed(collection, &table, err))
            }
        }
    }
}
