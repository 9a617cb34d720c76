//! Typed accessors over untyped vendor JSON.
//!
//! Media server payloads are loosely typed: ids arrive as numbers on one
//! server and strings on another, counters come back as `"12"`, and optional
//! blocks are either missing, `null`, or an empty object. Every parser reads
//! through these helpers so a malformed field degrades to a typed default
//! instead of failing the whole session.
//!
//! Conventions:
//! - `read_*` returns a plain default (`""`, `0`, `false`) when the field is
//!   missing or unusable.
//! - `read_opt_*` returns `None` in the same situations, and also for empty
//!   strings, so "absent" never masquerades as a real value.

use serde_json::Value;

/// Field lookup that treats `null` the same as a missing key.
pub fn field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value.get(key) {
        Some(Value::Null) | None => None,
        Some(found) => Some(found),
    }
}

/// Stringify scalars; objects, arrays and missing fields become `None`.
pub fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<i64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn read_string(value: &Value, key: &str) -> String {
    read_opt_string(value, key).unwrap_or_default()
}

pub fn read_opt_string(value: &Value, key: &str) -> Option<String> {
    field(value, key)
        .and_then(as_string)
        .filter(|s| !s.trim().is_empty())
}

pub fn read_i64(value: &Value, key: &str) -> i64 {
    read_opt_i64(value, key).unwrap_or(0)
}

pub fn read_opt_i64(value: &Value, key: &str) -> Option<i64> {
    field(value, key).and_then(as_i64)
}

pub fn read_bool(value: &Value, key: &str) -> bool {
    read_opt_bool(value, key).unwrap_or(false)
}

pub fn read_opt_bool(value: &Value, key: &str) -> Option<bool> {
    field(value, key).and_then(as_bool)
}

/// Array field, or an empty slice for anything else.
pub fn read_array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match field(value, key) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

/// Object field, skipping empty `{}` placeholders.
pub fn read_object<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match field(value, key) {
        Some(obj @ Value::Object(map)) if !map.is_empty() => Some(obj),
        _ => None,
    }
}

/// First non-empty string of a string array field.
pub fn read_first_string(value: &Value, key: &str) -> Option<String> {
    read_array(value, key)
        .iter()
        .filter_map(as_string)
        .find(|s| !s.trim().is_empty())
}

/// Payloads are sometimes a bare array and sometimes wrapped in an object
/// under `key`; accept both.
pub fn items_or_wrapped<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    match value {
        Value::Array(items) => items.as_slice(),
        other => read_array(other, key),
    }
}
