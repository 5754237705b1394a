//! Structured key filters
//!
//! A parameterized alternative to `DocumentStore::list_keys_where_sql`:
//! every caller-supplied value is bound, never interpolated.

use crate::sql;
use serde_json::Value;

/// Predicate selecting document keys within a collection
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFilter {
    /// Keys starting with the given string (byte-wise, case-sensitive)
    KeyPrefix(String),
    /// Documents whose payload has `value` at the SQLite JSON `path`
    /// (e.g. `$.status`). Intended for scalar values. `Value::Null` matches
    /// an explicit `null`, never a missing path.
    JsonEquals { path: String, value: Value },
}

impl KeyFilter {
    pub fn key_prefix(prefix: impl Into<String>) -> Self {
        KeyFilter::KeyPrefix(prefix.into())
    }

    pub fn json_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        KeyFilter::JsonEquals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Statement text and bind values, in order
    pub(crate) fn to_query(&self, table: &str) -> (String, Vec<String>) {
        match self {
            KeyFilter::KeyPrefix(prefix) => {
                (sql::select_keys_with_prefix(table), vec![prefix.clone()])
            }
            KeyFilter::JsonEquals { path, value } => (
                sql::select_keys_with_json_value(table),
                vec![path.clone(), value.to_string()],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prefix_is_bound_not_interpolated() {
        let (stmt, binds) = KeyFilter::key_prefix("a' OR 1=1 --").to_query("t_users");
        assert!(!stmt.contains("OR 1=1"));
        assert_eq!(binds, vec!["a' OR 1=1 --".to_string()]);
    }

    #[test]
    fn test_json_value_bound_as_json_text() {
        let (_, binds) = KeyFilter::json_equals("$.status", json!("active")).to_query("t");
        assert_eq!(binds, vec!["$.status".to_string(), "\"active\"".to_string()]);
    }
}
