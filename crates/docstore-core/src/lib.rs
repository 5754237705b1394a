//! docstore core - backend-independent building blocks
//!
//! This crate provides the pieces of the document store that do not touch
//! the relational backend:
//! - Error facility (`DocStoreError` taxonomy plus the structured `ExError`)
//! - Structured logging facility and operation macros
//! - Payload encoding and content digests
//! - Structural JSON equality for change detection

pub mod digest;
pub mod equality;
pub mod errors;
pub mod logging_facility;

/// Re-exported so the logging macros resolve schema constants from any crate
pub use docstore_core_types as core_types;

// Re-export commonly used types
pub use digest::{content_digest, encode_payload, EncodedDocument};
pub use equality::deep_equal;
pub use errors::{DocStoreError, ExError, ExErrorKind, Result};
