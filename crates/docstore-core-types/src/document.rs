//! Document-level types returned by the store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a document key, in bytes (the `id` column is `VARCHAR(128)`)
pub const MAX_KEY_BYTES: usize = 128;

/// Row metadata for a stored document, without its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document key (`id` column)
    pub key: String,
    /// Content digest (`xxh` column)
    pub digest: u64,
    /// Set once when the row is first inserted
    pub create_time: DateTime<Utc>,
    /// Refreshed whenever the row content changes
    pub update_time: DateTime<Utc>,
}

/// Result of a change-detecting write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// A row was inserted or rewritten
    Written,
    /// The backend affected no rows: identical content, or the write was ignored
    Unchanged,
}

impl WriteOutcome {
    /// Stable lowercase label, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Written => "written",
            WriteOutcome::Unchanged => "unchanged",
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
