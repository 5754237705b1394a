//! Statement text for collection tables
//!
//! Table names are interpolated into the statements as-is, wrapped in
//! backticks. They are not escaped or validated: a collection name
//! containing a backtick produces a malformed statement, which surfaces as
//! a backend error (`TableCreationFailed` on first use). Every value is
//! bound as a parameter.

/// Current time with millisecond precision, as stored in `update_time`
const NOW_MILLIS: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Format used to parse `update_time` back
pub const UPDATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Idempotent table creation for one collection
pub fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (
            `aid` INTEGER PRIMARY KEY AUTOINCREMENT,
            `id` VARCHAR(128) NOT NULL UNIQUE,
            `j` TEXT NOT NULL,
            `xxh` INTEGER UNIQUE,
            `create_time` INTEGER NOT NULL DEFAULT (CAST(strftime('%s', 'now') AS INTEGER)),
            `update_time` TEXT NOT NULL DEFAULT ({NOW_MILLIS})
        )"
    )
}

/// Insert, or overwrite the existing row for the key.
///
/// Binds: `?1` key, `?2` payload, `?3` digest. Only the `id` conflict is
/// resolved; a digest owned by another key fails the statement.
pub fn upsert(table: &str) -> String {
    format!(
        "INSERT INTO `{table}` (`id`, `j`, `xxh`) VALUES (?1, ?2, ?3)
         ON CONFLICT(`id`) DO UPDATE SET
            `j` = excluded.`j`,
            `xxh` = excluded.`xxh`,
            `update_time` = {NOW_MILLIS}"
    )
}

/// Insert, or rewrite the existing row only when its digest differs.
///
/// Binds as `upsert`. `OR IGNORE` applies to the constraints the upsert
/// target does not cover, so a new key whose digest is already owned by a
/// different key is dropped without error and affects no rows. The
/// `DO UPDATE` branch is not covered by `OR IGNORE`: rewriting an existing
/// key to a digest another key owns fails the statement, and the caller
/// treats that failure as ignored.
pub fn insert_if_changed(table: &str) -> String {
    format!(
        "INSERT OR IGNORE INTO `{table}` (`id`, `j`, `xxh`) VALUES (?1, ?2, ?3)
         ON CONFLICT(`id`) DO UPDATE SET
            `j` = excluded.`j`,
            `xxh` = excluded.`xxh`,
            `update_time` = {NOW_MILLIS}
         WHERE `xxh` IS NOT excluded.`xxh`"
    )
}

/// Payload for one key. Binds: `?1` key.
pub fn select_payload(table: &str) -> String {
    format!("SELECT `j` FROM `{table}` WHERE `id` = ?1 LIMIT 1")
}

/// Row metadata for one key. Binds: `?1` key.
pub fn select_meta(table: &str) -> String {
    format!(
        "SELECT `id`, `xxh`, `create_time`, `update_time` FROM `{table}` WHERE `id` = ?1 LIMIT 1"
    )
}

/// Every key, in insertion order
pub fn select_keys(table: &str) -> String {
    format!("SELECT `id` FROM `{table}` ORDER BY `aid`")
}

/// Keys matching a caller-supplied condition, pasted verbatim.
pub fn select_keys_where_raw(table: &str, condition: &str) -> String {
    format!("SELECT `id` FROM `{table}` WHERE {condition}")
}

/// Keys whose `id` starts with `?1`
pub fn select_keys_with_prefix(table: &str) -> String {
    format!(
        "SELECT `id` FROM `{table}` WHERE substr(`id`, 1, length(?1)) = ?1 ORDER BY `aid`"
    )
}

/// Keys whose payload has JSON path `?1` equal to the JSON value `?2`
///
/// `IS` makes a JSON `null` match a stored `null`; the `json_type` guard
/// keeps documents that lack the path from matching it.
pub fn select_keys_with_json_value(table: &str) -> String {
    format!(
        "SELECT `id` FROM `{table}` \
         WHERE json_type(`j`, ?1) IS NOT NULL \
         AND json_extract(`j`, ?1) IS json_extract(?2, '$') \
         ORDER BY `aid`"
    )
}
