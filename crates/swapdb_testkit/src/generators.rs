//! Property-based test generators using proptest.
//!
//! Provides strategies for values the codecs must round-trip.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Strategy for widget names, including non-ASCII text.
pub fn widget_name_strategy() -> impl Strategy<Value = String> {
    "\\PC{1,24}"
}

/// Strategy for finite floats, the ones JSON can represent.
pub fn finite_float_strategy() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

/// Strategy for JSON scalars.
pub fn json_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        finite_float_strategy().prop_map(Value::from),
        "\\PC{0,16}".prop_map(Value::String),
    ]
}

/// Strategy for arbitrary JSON documents: mappings, sequences and scalars.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_scalar_strategy().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..8)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Strategy for ordered sequences of JSON values.
pub fn json_sequence_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(json_value_strategy(), 0..8)
}

/// A nested record for exercising the binary codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier pair.
    pub key: (String, u32),
    /// Optional free text.
    pub comment: Option<String>,
    /// Keyed by non-string keys, which JSON could not hold.
    pub factors: BTreeMap<i32, f64>,
    /// Nested children.
    pub children: Vec<Record>,
    /// Raw bytes.
    pub payload: Vec<u8>,
}

/// Strategy for [`Record`] trees.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    let finite = finite_float_strategy();
    let leaf = (
        ("[a-z]{1,8}", any::<u32>()),
        prop::option::of("\\PC{0,16}"),
        prop::collection::btree_map(any::<i32>(), finite, 0..4),
        prop::collection::vec(any::<u8>(), 0..32),
    )
        .prop_map(|(key, comment, factors, payload)| Record {
            key,
            comment,
            factors,
            children: Vec::new(),
            payload,
        });

    leaf.prop_recursive(3, 16, 4, |inner| {
        (inner.clone(), prop::collection::vec(inner, 0..4)).prop_map(|(mut parent, children)| {
            parent.children = children;
            parent
        })
    })
}
