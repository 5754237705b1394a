//! Canonical schema constants for structured logging and events
//!
//! These constants ensure consistency across all logging and error reporting.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Entity identifiers
pub const FIELD_COLLECTION: &str = "collection";
pub const FIELD_KEY: &str = "key";
pub const FIELD_TABLE: &str = "table";

// Connection lifecycle
pub const FIELD_ATTEMPT: &str = "attempt";
pub const FIELD_RETRY_AFTER_SECS: &str = "retry_after_secs";

// Result sizes
pub const FIELD_KEY_COUNT: &str = "key_count";
pub const FIELD_OUTCOME: &str = "outcome";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
