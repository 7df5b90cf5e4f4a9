//! Deterministic content hashing for row data.
//!
//! The hash is a hex-encoded SHA-256 over a canonical, tagged encoding of the
//! JSON value. Object entries are encoded in key order, so two documents that
//! differ only in the order their keys were written hash identically.
//! Numbers are normalized so that `1` and `1.0` hash the same.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha256};

/// Largest integer an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Hash a JSON value.
pub fn hash_value(value: &Value) -> String {
    let mut hasher = Sha256::new();
    encode_value(&mut hasher, value);
    let out = hasher.finalize();

    let mut s = String::with_capacity(64);
    for b in out {
        s.push_str(&format!("{:02x}", b));
    }
    s
}

fn encode_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"n"),
        Value::Bool(true) => hasher.update(b"t"),
        Value::Bool(false) => hasher.update(b"f"),
        Value::Number(n) => {
            hasher.update(b"d");
            encode_str(hasher, &canonical_number(n));
        }
        Value::String(s) => {
            hasher.update(b"s");
            encode_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update(b"a");
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                encode_value(hasher, item);
            }
        }
        Value::Object(map) => encode_object(hasher, map),
    }
}

fn encode_object(hasher: &mut Sha256, map: &Map<String, Value>) {
    // serde_json keeps insertion order under `preserve_order`
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    hasher.update(b"o");
    hasher.update((entries.len() as u64).to_be_bytes());
    for (key, value) in entries {
        encode_str(hasher, key);
        encode_value(hasher, value);
    }
}

fn encode_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
