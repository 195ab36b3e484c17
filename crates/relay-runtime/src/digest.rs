//! Input digests and output summaries for the execution log.
//!
//! `hash_input` keys both the audit trail and the dedup cache, so it must be
//! deterministic across key order: objects are rendered with sorted keys
//! before hashing.

use hex::ToHex;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Maximum number of characters kept in an output summary.
pub const MAX_SUMMARY_CHARS: usize = 200;

/// Appended to summaries that were cut at [`MAX_SUMMARY_CHARS`].
pub const TRUNCATION_MARKER: &str = "...";

/// Computes the SHA-256 digest of a value's canonical JSON rendering.
///
/// Never returns an empty string. A value that cannot be serialized is
/// hashed through a tagged fallback so the digest stays stable.
pub fn hash_input<T: Serialize + ?Sized>(value: &T) -> String {
    let rendered = match serde_json::to_value(value) {
        Ok(v) => canonical_json(&v),
        Err(e) => format!("<unserializable:{e}>"),
    };
    let mut hasher = Sha256::new();
    hasher.update(rendered.as_bytes());
    hasher.finalize().encode_hex::<String>()
}

/// Renders a JSON value with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), sort_keys(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Caps `text` at [`MAX_SUMMARY_CHARS`] characters, appending the marker
/// when anything was cut.
pub fn summarize_output(text: &str) -> String {
    match text.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Human-readable rendering of a result payload: strings verbatim,
/// everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
