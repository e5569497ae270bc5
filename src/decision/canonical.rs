//! Canonical JSON serialization and the audit digest.
//!
//! Object keys are sorted recursively and written with compact separators,
//! so the digest depends only on content and never on construction order.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{EngineError, EngineResult};

/// Digest algorithm recorded in the audit block.
pub const HASH_ALGORITHM: &str = "sha256";

/// Canonicalization scheme recorded in the audit block.
pub const CANONICALIZATION: &str = "json-sorted-keys-v1";

/// Serializes a value as canonical JSON.
///
/// # Example
///
/// ```
/// use income_engine::decision::canonical_json;
/// use serde_json::json;
///
/// let text = canonical_json(&json!({"b": 1, "a": {"d": [2, 1], "c": null}})).unwrap();
/// assert_eq!(text, r#"{"a":{"c":null,"d":[2,1]},"b":1}"#);
/// ```
pub fn canonical_json<T: Serialize>(value: &T) -> EngineResult<String> {
    let value = serde_json::to_value(value).map_err(canonicalization_error)?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

/// Lowercase hex SHA-256 of the canonical JSON of a value.
pub fn canonical_hash<T: Serialize>(value: &T) -> EngineResult<String> {
    let canonical = canonical_json(value)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

fn write_canonical(value: &Value, out: &mut String) -> EngineResult<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            out.push('{');
            for (index, (key, child)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).map_err(canonicalization_error)?);
                out.push(':');
                write_canonical(child, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, child) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(child, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar).map_err(canonicalization_error)?),
    }
    Ok(())
}

fn canonicalization_error(error: serde_json::Error) -> EngineError {
    EngineError::Canonicalization {
        message: error.to_string(),
    }
}
