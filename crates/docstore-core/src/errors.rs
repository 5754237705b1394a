use thiserror::Error;

/// Result type alias using DocStoreError
pub type Result<T> = std::result::Result<T, DocStoreError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the document store. Each kind maps to a stable error code that
/// can be used for programmatic error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    InvalidInput,
    InvalidConfig,

    // Documents
    NotFound,
    ConstraintViolation,

    // Backend
    ConnectionUnavailable,
    TableCreation,
    Persistence,

    // Codec
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::ConnectionUnavailable => "ERR_CONNECTION_UNAVAILABLE",
            ExErrorKind::TableCreation => "ERR_TABLE_CREATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification fields used by the logging macros, plus the
/// collection/key context of the failing operation.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    collection: Option<String>,
    key: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            collection: None,
            key: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add collection context
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Add document key context
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(collection) = &self.collection {
            write!(f, " (collection: {})", collection)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for document store operations
///
/// Backend failures are carried as rendered messages so this crate stays
/// independent of the relational driver; the store crate classifies driver
/// errors into these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocStoreError {
    // ===== Connection =====
    /// The backend could not be reached.
    ///
    /// Connection establishment retries forever, so store operations never
    /// return this; it exists for connectors reporting a failed attempt.
    #[error("Backend connection unavailable: {message}")]
    ConnectionUnavailable { message: String },

    // ===== Schema =====
    /// The backend rejected the idempotent create for a collection's table
    #[error("Failed to create table {table} for collection {collection}: {message}")]
    TableCreationFailed {
        collection: String,
        table: String,
        message: String,
    },

    // ===== Documents =====
    /// No row for the key, or the payload column is NULL
    #[error("Document not found: {collection}/{key}")]
    DocumentNotFound { collection: String, key: String },

    /// Key is empty or longer than the `id` column allows
    #[error("Invalid document key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Unique-key or unique-digest conflict reported by the backend
    #[error("Constraint violation in collection {collection}: {message}")]
    BackendConstraintViolation { collection: String, message: String },

    // ===== Generic =====
    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    SerializationFailed { message: String },

    /// Any other backend failure
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Rejected configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl DocStoreError {
    /// Canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            DocStoreError::ConnectionUnavailable { .. } => ExErrorKind::ConnectionUnavailable,
            DocStoreError::TableCreationFailed { .. } => ExErrorKind::TableCreation,
            DocStoreError::DocumentNotFound { .. } => ExErrorKind::NotFound,
            DocStoreError::InvalidKey { .. } => ExErrorKind::InvalidInput,
            DocStoreError::BackendConstraintViolation { .. } => ExErrorKind::ConstraintViolation,
            DocStoreError::SerializationFailed { .. } => ExErrorKind::Serialization,
            DocStoreError::Backend { .. } => ExErrorKind::Persistence,
            DocStoreError::InvalidConfig { .. } => ExErrorKind::InvalidConfig,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DocStoreError::DocumentNotFound { .. })
    }
}

/// Conversion from DocStoreError to ExError
///
/// Lets the `log_op_error!` macro accept domain errors directly.
impl From<DocStoreError> for ExError {
    fn from(err: DocStoreError) -> Self {
        let kind = err.kind();
        let message = err.to_string();
        match err {
            DocStoreError::TableCreationFailed { collection, .. } => ExError::new(kind)
                .with_op("ensure_table")
                .with_collection(collection)
                .with_message(message),

            DocStoreError::DocumentNotFound { collection, key } => ExError::new(kind)
                .with_collection(collection)
                .with_key(key)
                .with_message("Document not found"),

            DocStoreError::InvalidKey { key, .. } => {
                ExError::new(kind).with_key(key).with_message(message)
            }

            DocStoreError::BackendConstraintViolation { collection, .. } => {
                ExError::new(kind).with_collection(collection).with_message(message)
            }

            DocStoreError::ConnectionUnavailable { .. }
            | DocStoreError::SerializationFailed { .. }
            | DocStoreError::Backend { .. }
            | DocStoreError::InvalidConfig { .. } => ExError::new(kind).with_message(message),
        }
    }
}

/// Conversion from serde_json::Error to DocStoreError
impl From<serde_json::Error> for DocStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocStoreError::SerializationFailed {
            message: err.to_string(),
        }
    }
}
