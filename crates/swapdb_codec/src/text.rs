//! Structured text codecs.
//!
//! Values are written as indented, human-diffable JSON: two-space indent,
//! non-ASCII characters written verbatim. Decoding yields the generic
//! structured form (`serde_json::Value`), not the type that was written.
//! Dates and times therefore come back as their calendar text.

use crate::calendar::{Calendar, CalendarText};
use crate::error::{CodecError, CodecResult};
use crate::value::ColumnValue;
use crate::{Document, FieldCodec, Storage};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Render a value as indented JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the value cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| CodecError::encode(e.to_string()))
}

/// Parse JSON text into the generic structured form.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the text is not valid JSON.
pub fn from_json_text(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::decode(e.to_string()))
}

/// Rejects documents holding floats JSON cannot represent.
fn check_finite(doc: &Document) -> CodecResult<()> {
    match doc {
        Document::Float(f) if !f.is_finite() => Err(CodecError::encode(format!(
            "float {f} has no JSON representation"
        ))),
        Document::Array(items) | Document::Tuple(items) => items.iter().try_for_each(check_finite),
        Document::Map(pairs) => pairs.iter().try_for_each(|(_, v)| check_finite(v)),
        _ => Ok(()),
    }
}

/// Parses a stored text column, mapping SQL `NULL` to JSON `null`.
fn parse_column(column: &ColumnValue) -> CodecResult<Value> {
    match column {
        ColumnValue::Null => Ok(Value::Null),
        ColumnValue::Text(text) => from_json_text(text),
        other => Err(CodecError::UnexpectedColumn {
            expected: "text",
            found: other.kind(),
        }),
    }
}

/// Types the text codecs can encode.
///
/// Implemented for [`Document`], `serde_json::Value` and [`Calendar`]; any
/// other `Serialize` type goes through the [`Json`] adapter. [`Document`]
/// and [`Json`] reject non-finite floats, which serde_json would otherwise
/// write as `null`.
pub trait JsonEncode {
    /// Render `self` as indented JSON text.
    fn to_json(&self) -> CodecResult<String>;
}

impl JsonEncode for Document {
    fn to_json(&self) -> CodecResult<String> {
        check_finite(self)?;
        to_json_text(self)
    }
}

impl JsonEncode for Value {
    fn to_json(&self) -> CodecResult<String> {
        to_json_text(self)
    }
}

impl<T: CalendarText> JsonEncode for Calendar<T> {
    fn to_json(&self) -> CodecResult<String> {
        to_json_text(self)
    }
}

/// Adapter that lets any `Serialize` type be encoded by the text codecs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Json<T>(pub T);

impl<T: Serialize> JsonEncode for Json<T> {
    fn to_json(&self) -> CodecResult<String> {
        // serde_json writes NaN and infinities as `null`; look first.
        let shape = ciborium::value::Value::serialized(&self.0)
            .map_err(|e| CodecError::encode(e.to_string()))?;
        check_finite_value(&shape)?;
        to_json_text(&self.0)
    }
}

fn check_finite_value(value: &ciborium::value::Value) -> CodecResult<()> {
    use ciborium::value::Value as Shape;
    match value {
        Shape::Float(f) if !f.is_finite() => Err(CodecError::encode(format!(
            "float {f} has no JSON representation"
        ))),
        Shape::Array(items) => items.iter().try_for_each(check_finite_value),
        Shape::Map(pairs) => pairs.iter().try_for_each(|(k, v)| {
            check_finite_value(k)?;
            check_finite_value(v)
        }),
        Shape::Tag(_, inner) => check_finite_value(inner),
        _ => Ok(()),
    }
}

/// Codec that stores values as indented JSON text.
///
/// Encoding accepts any [`JsonEncode`] value; decoding returns the generic
/// `serde_json::Value`. The round trip is exact for JSON-representable
/// values and deliberately lossy for calendar values.
pub struct JsonCodec<T: ?Sized = Document> {
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> JsonCodec<T> {
    /// Creates a new JSON codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for JsonCodec<T> {}

impl<T: ?Sized> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: JsonEncode + ?Sized> FieldCodec for JsonCodec<T> {
    type Input = T;
    type Output = Value;

    fn storage(&self) -> Storage {
        Storage::Text
    }

    fn encode(&self, value: &T) -> CodecResult<ColumnValue> {
        value.to_json().map(ColumnValue::Text)
    }

    fn decode(&self, column: &ColumnValue) -> CodecResult<Value> {
        parse_column(column)
    }
}

/// A value read back by [`TupleJsonCodec`].
#[derive(Debug, Clone, PartialEq)]
pub enum Restored {
    /// A top-level sequence, restored as a fixed-arity tuple.
    Tuple(Box<[Value]>),
    /// Any other top-level value.
    Value(Value),
}

impl Restored {
    /// Returns the tuple elements if this is a tuple.
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Restored::Tuple(items) => Some(items),
            Restored::Value(_) => None,
        }
    }

    /// Returns the tuple arity, or `None` for non-tuple values.
    pub fn arity(&self) -> Option<usize> {
        self.as_tuple().map(<[Value]>::len)
    }

    /// Converts back to the generic structured form.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Restored::Tuple(items) => Value::Array(items.into_vec()),
            Restored::Value(value) => value,
        }
    }
}

/// Codec that restores top-level sequences as tuples on decode.
///
/// Encoding is identical to [`JsonCodec`]: tuples are written as ordinary
/// arrays. On decode, SQL `NULL` and JSON `null` both yield `None`, a
/// top-level array yields [`Restored::Tuple`], anything else yields
/// [`Restored::Value`]. Nested arrays stay arrays.
pub struct TupleJsonCodec<T: ?Sized = Document> {
    inner: JsonCodec<T>,
}

impl<T: ?Sized> TupleJsonCodec<T> {
    /// Creates a new tuple-restoring codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: JsonCodec::new(),
        }
    }
}

impl<T: ?Sized> Default for TupleJsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for TupleJsonCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for TupleJsonCodec<T> {}

impl<T: ?Sized> fmt::Debug for TupleJsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TupleJsonCodec")
    }
}

impl<T: JsonEncode + ?Sized> FieldCodec for TupleJsonCodec<T> {
    type Input = T;
    type Output = Option<Restored>;

    fn storage(&self) -> Storage {
        Storage::Text
    }

    fn encode(&self, value: &T) -> CodecResult<ColumnValue> {
        self.inner.encode(value)
    }

    fn decode(&self, column: &ColumnValue) -> CodecResult<Option<Restored>> {
        Ok(match self.inner.decode(column)? {
            Value::Null => None,
            Value::Array(items) => Some(Restored::Tuple(items.into_boxed_slice())),
            other => Some(Restored::Value(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CalendarValue;
    use chrono::NaiveDate;
    use serde_json::json;

    fn stored_text(column: &ColumnValue) -> &str {
        column.as_text().expect("text column")
    }

    #[test]
    fn pretty_two_space_indent() {
        let codec = JsonCodec::<Value>::new();
        let stored = codec.encode(&json!({"a": [1]})).unwrap();
        assert_eq!(stored_text(&stored), "{\n  \"a\": [\n    1\n  ]\n}");
    }

    #[test]
    fn non_ascii_is_not_escaped() {
        let codec = JsonCodec::<Value>::new();
        let stored = codec.encode(&json!("Zürich 東京")).unwrap();
        assert_eq!(stored_text(&stored), "\"Zürich 東京\"");
    }

    #[test]
    fn roundtrip_generic_values() {
        let codec = JsonCodec::<Value>::new();
        for value in [
            json!(null),
            json!(true),
            json!(-17),
            json!(2.25),
            json!("text"),
            json!([1, "two", [3.5, null]]),
            json!({"k": {"nested": [false]}, "n": 0}),
        ] {
            let stored = codec.encode(&value).unwrap();
            assert_eq!(codec.decode(&stored).unwrap(), value);
        }
    }

    #[test]
    fn calendar_values_decode_as_text() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let doc = Document::map([
            ("name", Document::from("audit")),
            ("on", Document::Calendar(CalendarValue::from(date))),
        ]);
        let codec = JsonCodec::<Document>::new();
        let decoded = codec.decode(&codec.encode(&doc).unwrap()).unwrap();

        // The typed date is not recovered; the stored text is.
        assert_eq!(decoded, json!({"name": "audit", "on": "2021-06-01"}));
        assert_ne!(Document::from(decoded), doc);
    }

    #[test]
    fn calendar_wrapper_encodes() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let codec = JsonCodec::<Calendar<NaiveDate>>::new();
        let stored = codec.encode(&Calendar(date)).unwrap();
        assert_eq!(codec.decode(&stored).unwrap(), json!("2021-06-01"));
    }

    #[test]
    fn serde_types_via_adapter() {
        #[derive(Serialize)]
        struct Unit {
            code: &'static str,
            factor: f64,
        }
        let codec = JsonCodec::<Json<Unit>>::new();
        let stored = codec
            .encode(&Json(Unit {
                code: "kg",
                factor: 1.0,
            }))
            .unwrap();
        assert_eq!(
            codec.decode(&stored).unwrap(),
            json!({"code": "kg", "factor": 1.0})
        );
    }

    #[test]
    fn non_finite_float_fails_encode() {
        let codec = JsonCodec::<Document>::new();
        let doc = Document::Array(vec![Document::Float(f64::NAN)]);
        assert!(matches!(
            codec.encode(&doc),
            Err(CodecError::Encode { .. })
        ));
    }

    #[test]
    fn non_finite_float_in_serde_type_fails_encode() {
        #[derive(Serialize)]
        struct Reading {
            label: &'static str,
            samples: Vec<Option<f64>>,
        }
        let codec = JsonCodec::<Json<Reading>>::new();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let reading = Reading {
                label: "flow",
                samples: vec![Some(1.0), Some(bad)],
            };
            assert!(matches!(
                codec.encode(&Json(reading)),
                Err(CodecError::Encode { .. })
            ));
        }

        let fine = Reading {
            label: "flow",
            samples: vec![Some(1.0), None],
        };
        let stored = codec.encode(&Json(fine)).unwrap();
        assert_eq!(
            codec.decode(&stored).unwrap(),
            json!({"label": "flow", "samples": [1.0, null]})
        );
    }

    #[test]
    fn float_text_roundtrip_is_exact() {
        let codec = JsonCodec::<Value>::new();
        for f in [1.0715660391465826e-75, 0.1, -2.2250738585072014e-308, 1.7976931348623157e308] {
            let stored = codec.encode(&json!(f)).unwrap();
            assert_eq!(codec.decode(&stored).unwrap().as_f64(), Some(f));
        }
    }

    #[test]
    fn malformed_text_fails_decode() {
        let codec = JsonCodec::<Value>::new();
        let err = codec
            .decode(&ColumnValue::Text("{\"a\": ".into()))
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }

    #[test]
    fn null_column_decodes_to_json_null() {
        let codec = JsonCodec::<Value>::new();
        assert_eq!(codec.decode(&ColumnValue::Null).unwrap(), Value::Null);
    }

    #[test]
    fn tuple_restored_from_sequence() {
        let codec = TupleJsonCodec::<Document>::new();
        let doc = Document::tuple([
            Document::from("biosphere"),
            Document::from("co2"),
            Document::from(3i64),
        ]);
        let stored = codec.encode(&doc).unwrap();
        assert_eq!(stored_text(&stored), "[\n  \"biosphere\",\n  \"co2\",\n  3\n]");

        let restored = codec.decode(&stored).unwrap().unwrap();
        assert_eq!(restored.arity(), Some(3));
        assert_eq!(
            restored.as_tuple().unwrap(),
            &[json!("biosphere"), json!("co2"), json!(3)]
        );
    }

    #[test]
    fn tuple_restoration_is_top_level_only() {
        let codec = TupleJsonCodec::<Value>::new();
        let stored = codec.encode(&json!([[1, 2], {"a": [3]}])).unwrap();
        let restored = codec.decode(&stored).unwrap().unwrap();
        let items = restored.as_tuple().unwrap();
        assert_eq!(items[0], json!([1, 2]));
        assert_eq!(items[1], json!({"a": [3]}));
    }

    #[test]
    fn empty_sequence_is_empty_tuple() {
        let codec = TupleJsonCodec::<Value>::new();
        let stored = codec.encode(&json!([])).unwrap();
        assert_eq!(codec.decode(&stored).unwrap().unwrap().arity(), Some(0));
    }

    #[test]
    fn null_is_absent_not_empty() {
        let codec = TupleJsonCodec::<Document>::new();
        let stored = codec.encode(&Document::Null).unwrap();
        assert_eq!(codec.decode(&stored).unwrap(), None);
        assert_eq!(codec.decode(&ColumnValue::Null).unwrap(), None);
    }

    #[test]
    fn non_sequence_passes_through() {
        let codec = TupleJsonCodec::<Value>::new();
        let stored = codec.encode(&json!({"a": 1})).unwrap();
        assert_eq!(
            codec.decode(&stored).unwrap(),
            Some(Restored::Value(json!({"a": 1})))
        );
    }

    #[test]
    fn into_value_reverses_restoration() {
        let restored = Restored::Tuple(vec![json!(1), json!(2)].into_boxed_slice());
        assert_eq!(restored.into_value(), json!([1, 2]));
    }
}
