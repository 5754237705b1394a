//! Structural comparison of JSON documents.
//!
//! `deep_equal` answers "did this document's meaning change" rather than
//! "are these bytes identical": object key order and whitespace are
//! irrelevant, and numbers compare by value.

use serde_json::{Map, Value};

/// Compare two encoded JSON objects at the decoded-object level.
///
/// Returns `false` if either input is not a JSON object.
pub fn deep_equal(a: &[u8], b: &[u8]) -> bool {
    let Ok(left) = serde_json::from_slice::<Map<String, Value>>(a) else {
        return false;
    };
    let Ok(right) = serde_json::from_slice::<Map<String, Value>>(b) else {
        return false;
    };
    objects_equal(&left, &right)
}

/// Structural equality of two decoded values.
///
/// Differs from `Value`'s `PartialEq` only for numbers: `1` and `1.0` are
/// the same number here.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if x == y {
                return true;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(fx), Some(fy)) => fx == fy,
                _ => false,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(x), Value::Object(y)) => objects_equal(x, y),
        _ => false,
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|other| values_equal(v, other)))
}
