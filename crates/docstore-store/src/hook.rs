//! Post-write observers
//!
//! An observer is told about every successful `write` and
//! `write_if_changed`, including change-detecting writes that left the row
//! untouched. Delivery is best-effort: the observer runs inline after the
//! statement succeeds, its errors are logged and dropped, and nothing is
//! retried or queued. A writer can never observe an observer failure.

use docstore_core::core_types::WriteOutcome;
use serde_json::Value;

/// Which write path produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Unconditional upsert (`DocumentStore::write`)
    Overwrite,
    /// Change-detecting insert (`DocumentStore::write_if_changed`)
    IfChanged,
}

/// A completed write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteEvent {
    pub collection: String,
    pub key: String,
    /// The written value, decoded from the stored payload
    pub value: Value,
    pub digest: u64,
    pub mode: WriteMode,
    /// `Unchanged` does not suppress the event
    pub outcome: WriteOutcome,
}

/// Receives write events
pub trait WriteObserver: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Errors are logged at warn level and otherwise ignored.
    fn after_write(&self, event: &WriteEvent) -> anyhow::Result<()>;
}

impl<F> WriteObserver for F
where
    F: Fn(&WriteEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn after_write(&self, event: &WriteEvent) -> anyhow::Result<()> {
        self(event)
    }
}

pub(crate) fn notify(observer: &dyn WriteObserver, event: &WriteEvent) {
    if let Err(err) = observer.after_write(event) {
        tracing::warn!(
            component = module_path!(),
            op = "after_write",
            collection = event.collection.as_str(),
            key = event.key.as_str(),
            error = %err,
            "Write observer failed; event dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event() -> WriteEvent {
        WriteEvent {
            collection: "users".to_string(),
            key: "u1".to_string(),
            value: json!({"name": "ada"}),
            digest: 7,
            mode: WriteMode::Overwrite,
            outcome: WriteOutcome::Written,
        }
    }

    #[test]
    fn test_closure_observer_receives_event() {
        let seen = AtomicUsize::new(0);
        let observer = |e: &WriteEvent| -> anyhow::Result<()> {
            assert_eq!(e.key, "u1");
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        notify(&observer, &event());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_error_is_swallowed() {
        let observer = |_: &WriteEvent| -> anyhow::Result<()> { anyhow::bail!("sink offline") };
        notify(&observer, &event());
    }
}
