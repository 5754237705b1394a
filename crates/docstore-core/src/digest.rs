//! Content digests and the canonical payload encoding.
//!
//! A document's digest is XXH64 (seed 0) over its encoded payload followed
//! by its key bytes. The key is part of the input so two keys holding the
//! same payload still get distinct digests, which is what lets the `xxh`
//! column carry a UNIQUE constraint.
//!
//! Payloads are encoded as JSON indented with one tab per level. The digest
//! is computed over exactly the bytes that get stored, so the encoding is
//! part of the on-disk contract: changing it changes every digest.

use crate::errors::Result;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use xxhash_rust::xxh64::xxh64;

const DIGEST_SEED: u64 = 0;

/// Encode a payload the way it is stored in the `j` column.
///
/// ## Errors
///
/// Returns `DocStoreError::SerializationFailed` if the value cannot be
/// represented as JSON (e.g. a map with non-string keys).
pub fn encode_payload<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(128);
    let formatter = PrettyFormatter::with_indent(b"\t");
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Digest of `payload ++ key`.
pub fn content_digest(payload: &[u8], key: &str) -> u64 {
    let mut input = Vec::with_capacity(payload.len() + key.len());
    input.extend_from_slice(payload);
    input.extend_from_slice(key.as_bytes());
    xxh64(&input, DIGEST_SEED)
}

/// An encoded payload together with its digest, ready to be bound into a
/// write statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub bytes: Vec<u8>,
    pub digest: u64,
}

impl EncodedDocument {
    /// Encode `value` and digest it under `key`.
    ///
    /// ## Errors
    ///
    /// Returns `DocStoreError::SerializationFailed` if encoding fails.
    pub fn new<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Self> {
        let bytes = encode_payload(value)?;
        let digest = content_digest(&bytes, key);
        Ok(Self { bytes, digest })
    }

    /// Payload as text. The encoder only ever produces UTF-8.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    /// Digest reinterpreted as the signed 64-bit value stored by SQLite
    pub fn digest_as_i64(&self) -> i64 {
        self.digest as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_uses_tab_indentation() {
        let bytes = encode_payload(&json!({"x": 1})).unwrap();
        assert_eq!(bytes, b"{\n\t\"x\": 1\n}");
    }

    #[test]
    fn test_digest_includes_key() {
        let payload = encode_payload(&json!({"x": 1})).unwrap();
        assert_ne!(content_digest(&payload, "a"), content_digest(&payload, "b"));
    }

    #[test]
    fn test_digest_is_xxh64_of_concatenation() {
        let payload = b"{}".to_vec();
        assert_eq!(content_digest(&payload, "k"), xxh64(b"{}k", 0));
    }

    #[test]
    fn test_digest_i64_roundtrip_preserves_bits() {
        let doc = EncodedDocument {
            bytes: Vec::new(),
            digest: u64::MAX - 7,
        };
        assert_eq!(doc.digest_as_i64() as u64, doc.digest);
    }
}
