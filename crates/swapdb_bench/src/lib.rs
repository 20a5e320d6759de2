//! Benchmark fixtures.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Deterministic payload of the given size.
pub fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}

/// A measurement record as an application would store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Identifier pair.
    pub key: (String, u32),
    /// Weighted factors keyed by position.
    pub factors: BTreeMap<i32, f64>,
    /// Opaque bytes.
    pub raw: Vec<u8>,
}

/// A sample with `width` factors and a 64 byte payload.
pub fn sample(width: usize) -> Sample {
    Sample {
        key: (format!("sample-{width}"), width as u32),
        factors: (0..width as i32).map(|i| (i, f64::from(i) * 0.5)).collect(),
        raw: payload(64),
    }
}

/// A JSON tree `depth` levels deep with `width` keys per level.
pub fn document(depth: usize, width: usize) -> Value {
    if depth == 0 {
        return json!(["leaf", 1.5, true]);
    }
    let map: serde_json::Map<String, Value> = (0..width)
        .map(|i| (format!("key_{i}"), document(depth - 1, width)))
        .collect();
    Value::Object(map)
}
