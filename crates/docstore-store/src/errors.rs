//! Error handling for docstore-store
//!
//! Classifies `sqlx` errors into the `DocStoreError` taxonomy

use docstore_core::errors::DocStoreError;

pub use docstore_core::errors::Result;

/// Create a database error from `sqlx::Error`
///
/// Unique-constraint violations become `BackendConstraintViolation` so
/// callers can tell a key/digest conflict from an infrastructure failure.
pub fn from_sqlx(collection: &str, err: sqlx::Error) -> DocStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return DocStoreError::BackendConstraintViolation {
                collection: collection.to_string(),
                message: db_err.message().to_string(),
            };
        }
    }
    DocStoreError::Backend {
        message: err.to_string(),
    }
}

/// Create a table creation error for a collection
pub fn table_creation_failed(collection: &str, table: &str, err: sqlx::Error) -> DocStoreError {
    DocStoreError::TableCreationFailed {
        collection: collection.to_string(),
        table: table.to_string(),
        message: err.to_string(),
    }
}

/// Create a not-found error for a document
pub fn document_not_found(collection: &str, key: &str) -> DocStoreError {
    DocStoreError::DocumentNotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

/// Create a connection error from a failed connect attempt
pub fn connection_unavailable(err: sqlx::Error) -> DocStoreError {
    DocStoreError::ConnectionUnavailable {
        message: err.to_string(),
    }
}
