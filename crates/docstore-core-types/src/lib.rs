//! Core types shared across docstore facilities
//!
//! This crate provides foundational types used by the error handling,
//! logging and storage layers:
//!
//! - **Document types**: DocumentMeta, WriteOutcome, key limits
//! - **Schema constants**: Canonical field keys and event names

pub mod document;
pub mod schema;

pub use document::{DocumentMeta, WriteOutcome, MAX_KEY_BYTES};
