//! Content fingerprints for agent configurations.
//!
//! A fingerprint is the SHA-256 digest of the canonical JSON form of a
//! configuration. Canonical form is compact JSON with object keys sorted
//! lexicographically at every depth; array order is preserved. Two documents
//! that differ only in key order therefore share a fingerprint, and any change
//! to a value produces a different one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Number of hex characters shown by [`ConfigFingerprint::short`].
const SHORT_LEN: usize = 16;

/// Lowercase hex SHA-256 digest of a canonicalized configuration.
///
/// Deserialization accepts any string so registries written by older tooling
/// still load; a foreign value simply never matches a fresh fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    /// Wraps an already computed digest.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for human-readable output.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("configuration is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Computes the fingerprint of any serializable configuration.
///
/// # Errors
///
/// Returns `FingerprintError::Serialize` if the value cannot be represented
/// as JSON (e.g. a map with non-string keys).
pub fn fingerprint<T: Serialize + ?Sized>(
    config: &T,
) -> Result<ConfigFingerprint, FingerprintError> {
    let value = serde_json::to_value(config)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(ConfigFingerprint(hex::encode(hasher.finalize())))
}

/// Appends the canonical encoding of `value` to `out`.
///
/// Keys are sorted here rather than relying on `serde_json::Map` ordering,
/// which flips to insertion order when any crate in the build enables the
/// `preserve_order` feature.
fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_64_lowercase_hex_chars() {
        let fp = fingerprint(&json!({ "name": "story" })).unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(fp.short().len(), 16);
    }

    #[test]
    fn key_order_does_not_matter() {
        let a: Value =
            serde_json::from_str(r#"{"name":"x","conf":{"llm":"gpt-4o","temperature":0.7}}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"conf":{"temperature":0.7,"llm":"gpt-4o"},"name":"x"}"#)
                .unwrap();
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn array_order_matters() {
        let a = fingerprint(&json!({ "scenes": ["cottage", "forest"] })).unwrap();
        let b = fingerprint(&json!({ "scenes": ["forest", "cottage"] })).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_form_is_compact_and_sorted() {
        let mut out = String::new();
        write_canonical(&json!({ "b": [1, { "d": null, "c": "x" }], "a": true }), &mut out)
            .unwrap();
        assert_eq!(out, r#"{"a":true,"b":[1,{"c":"x","d":null}]}"#);
    }

    #[test]
    fn short_handles_foreign_values() {
        assert_eq!(ConfigFingerprint::from_hex("abc").short(), "abc");
    }
}
