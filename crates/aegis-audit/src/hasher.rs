// hasher.rs — SHA-256 hashing utilities.
//
// All hashes here are SHA-256, hex-encoded. `canonicalize_params` sorts
// object keys before hashing so the same logical params always hash the
// same way regardless of field order on the wire.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Recursively sort object keys so hashing is insensitive to field order.
/// Arrays keep their order — order is semantically meaningful there.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonicalize a params object and hash it. This is what the Decision Ring
/// and telemetry store in place of raw params (spec §4.7).
pub fn canonicalize_params(params: &Value) -> String {
    let canonical = canonicalize(params);
    hash_str(&canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_determinism() {
        let input = b"hello world";
        assert_eq!(hash_bytes(input), hash_bytes(input));
    }

    #[test]
    fn hash_is_hex_encoded_sha256() {
        let hash = hash_str("test");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn hash_known_value() {
        assert_eq!(
            hash_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn canonicalize_ignores_key_order() {
        let a = json!({"amount": 100, "currency": "USD"});
        let b = json!({"currency": "USD", "amount": 100});
        assert_eq!(canonicalize_params(&a), canonicalize_params(&b));
    }

    #[test]
    fn canonicalize_is_sensitive_to_values() {
        let a = json!({"amount": 100});
        let b = json!({"amount": 200});
        assert_ne!(canonicalize_params(&a), canonicalize_params(&b));
    }

    #[test]
    fn canonicalize_recurses_into_nested_objects() {
        let a = json!({"outer": {"b": 1, "a": 2}});
        let b = json!({"outer": {"a": 2, "b": 1}});
        assert_eq!(canonicalize_params(&a), canonicalize_params(&b));
    }

    #[test]
    fn canonicalize_preserves_array_order() {
        let a = json!({"items": [1, 2, 3]});
        let b = json!({"items": [3, 2, 1]});
        assert_ne!(canonicalize_params(&a), canonicalize_params(&b));
    }
}
