//! Key-case conversion between the provider's wire format and internal types.
//!
//! The provider speaks `snake_case` keys; internal types serialize with
//! `camelCase` keys. Every request and response crosses this boundary, and so
//! does every webhook payload once its signature has been checked.
//!
//! Conversion is a structural fold over [`serde_json::Value`]: objects have
//! their keys renamed, arrays have their elements folded, and scalars pass
//! through untouched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Rename a single key to `snake_case`.
///
/// Inserts `_` before every uppercase letter and lowercases the result.
/// Keys that are already `snake_case` come back unchanged.
pub fn snake_case_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_uppercase() {
            out.push('_');
        }
        out.extend(ch.to_lowercase());
    }
    out
}

/// Rename a single key to `camelCase`.
///
/// Every `_` followed by a lowercase letter is dropped and the letter is
/// uppercased. Any other `_` is kept as-is.
pub fn camel_case_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_lowercase() {
                    chars.next();
                    out.extend(next.to_uppercase());
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// Fold over a value, renaming every object key with `rename`.
///
/// Keys that collide after renaming (`event_type` and `eventType` both map
/// to `eventType`) collapse into one entry. The value iterated last wins and
/// the other is dropped without error.
pub fn map_keys<F>(value: Value, rename: &F) -> Value
where
    F: Fn(&str) -> String,
{
    match value {
        Value::Object(fields) => {
            let mut renamed = Map::with_capacity(fields.len());
            for (key, inner) in fields {
                renamed.insert(rename(&key), map_keys(inner, rename));
            }
            Value::Object(renamed)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| map_keys(item, rename)).collect())
        }
        scalar => scalar,
    }
}

/// Convert every key in `value` to `snake_case` (wire format).
pub fn to_snake_case_keys(value: Value) -> Value {
    map_keys(value, &snake_case_key)
}

/// Convert every key in `value` to `camelCase` (internal format).
pub fn to_camel_case_keys(value: Value) -> Value {
    map_keys(value, &camel_case_key)
}

/// Serialize an internal type and convert it to wire format.
pub fn to_wire<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    Ok(to_snake_case_keys(serde_json::to_value(value)?))
}

/// Convert a wire value to internal format and deserialize it.
pub fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(to_camel_case_keys(value))
}
