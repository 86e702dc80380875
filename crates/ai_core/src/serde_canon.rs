//! Canonical JSON for persisted artifacts
//!
//! Object keys are emitted in sorted order with no insignificant whitespace,
//! so the same value always produces the same bytes and the same blake3 digest.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanonicalError {
    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("non-finite number cannot be represented: {0}")]
    NonFinite(String),
}

/// Serialize `value` into canonical JSON.
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let tree = serde_json::to_value(value)?;
    let canonical = sort_keys(tree);
    Ok(serde_json::to_string(&canonical)?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key, sort_keys(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Reject a non-finite float before it reaches canonical JSON, where
/// serde_json would write it as `null`.
pub fn ensure_finite(label: &str, value: f64) -> Result<f64, CanonicalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CanonicalError::NonFinite(format!("{label}={value}")))
    }
}

/// blake3 digest of raw bytes as lowercase hex.
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// blake3 digest of the canonical JSON form of `value`.
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String, CanonicalError> {
    let json = to_canonical_json(value)?;
    Ok(digest_hex(json.as_bytes()))
}
