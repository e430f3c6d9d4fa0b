//! Canonical JSON form used for structural equality and fingerprints
//!
//! Two values are semantically equal when they agree after
//! [`normalize`]: object members whose value is `null` are dropped
//! (an explicit `null` and an absent field both mean "absent"), member
//! order is ignored, and arrays are compared element by element.

use serde_json::{Map, Value};

/// Strip `null` object members, recursively
///
/// Array elements are kept as-is (a `null` inside an array is data).
#[must_use]
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), normalize(v)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        other => other.clone(),
    }
}

/// Structural equality modulo member order and `null` members
#[must_use]
pub fn semantically_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => objects_equal(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(v, w)| semantically_equal(v, w))
        }
        _ => a == b,
    }
}

/// [`semantically_equal`] for two JSON objects
#[must_use]
pub fn objects_equal(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    let present = |map: &Map<String, Value>| map.values().filter(|v| !v.is_null()).count();
    if present(left) != present(right) {
        return false;
    }
    left.iter()
        .filter(|(_, v)| !v.is_null())
        .all(|(k, v)| right.get(k).is_some_and(|w| semantically_equal(v, w)))
}

/// Deterministic byte encoding of the normalized value
///
/// Object members are emitted in sorted key order regardless of how the
/// underlying map orders them.
#[must_use]
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().filter(|(_, v)| !v.is_null()).collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push(b'{');
            for (i, (key, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String(key.clone()), out);
                out.push(b':');
                write_canonical(v, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(v, out);
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    // Scalars always serialize; the fallback only guards the impossible case.
    match serde_json::to_vec(value) {
        Ok(bytes) => out.extend_from_slice(&bytes),
        Err(_) => out.extend_from_slice(b"null"),
    }
}
