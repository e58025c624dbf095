//! Cache key derivation
//!
//! Keys have the form `{namespace}_{operation}_{params}` where `params` is a
//! canonical JSON rendering with object keys sorted at every depth. Absent
//! params render as `{}`.

use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

const SEPARATOR: char = '_';

/// Derives the cache key for a query.
///
/// Namespace and operation must be non-empty and free of `_`, which keeps
/// the key format unambiguous.
pub fn derive_key<P>(namespace: &str, operation: &str, params: Option<&P>) -> Result<String>
where
    P: Serialize + ?Sized,
{
    validate_segment("namespace", namespace)?;
    validate_segment("operation", operation)?;

    let canonical = match params {
        Some(params) => canonical_json(&serde_json::to_value(params)?),
        None => "{}".to_string(),
    };

    Ok(format!(
        "{namespace}{SEPARATOR}{operation}{SEPARATOR}{canonical}"
    ))
}

/// Key prefix shared by every query of one operation, usable as an
/// invalidation pattern.
pub fn operation_prefix(namespace: &str, operation: &str) -> String {
    format!("{namespace}{SEPARATOR}{operation}{SEPARATOR}")
}

fn validate_segment(label: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(CacheError::Serialization(format!(
            "cache key {label} cannot be empty"
        )));
    }
    if segment.contains(SEPARATOR) {
        return Err(CacheError::Serialization(format!(
            "cache key {label} '{segment}' must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}

/// Renders a JSON value with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Strings always serialize
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
