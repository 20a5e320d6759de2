//! Dynamic structured value for the text codecs.

use crate::calendar::{CalendarText, CalendarValue};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A dynamic, order-preserving structured value.
///
/// `Document` is what callers build when the shape of a JSON column is not
/// known at compile time. Unlike `serde_json::Value` it can hold tuples and
/// calendar values: tuples are written as ordinary arrays and calendar values
/// as their ISO-8601 text.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Float. Must be finite to encode.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    Array(Vec<Document>),
    /// Fixed-arity sequence; encoded exactly like an array.
    Tuple(Vec<Document>),
    /// Mapping with string keys in insertion order.
    Map(Vec<(String, Document)>),
    /// Date or time value.
    Calendar(CalendarValue),
}

impl Document {
    /// Create a map document from key/value pairs, keeping their order.
    pub fn map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Document)>) -> Self {
        Document::Map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a tuple document.
    pub fn tuple(items: impl IntoIterator<Item = Document>) -> Self {
        Document::Tuple(items.into_iter().collect())
    }

    /// Check if this document is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    /// Look up a key in this map document.
    pub fn get(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Integer(n) => serializer.serialize_i64(*n),
            Document::Float(f) => serializer.serialize_f64(*f),
            Document::Text(s) => serializer.serialize_str(s),
            Document::Array(items) | Document::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Map(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Document::Calendar(value) => serializer.serialize_str(&value.to_calendar_text()),
        }
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Integer(i),
                None => Document::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Document::Text(s),
            Value::Array(items) => Document::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Document::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<i64> for Document {
    fn from(n: i64) -> Self {
        Document::Integer(n)
    }
}

impl From<f64> for Document {
    fn from(f: f64) -> Self {
        Document::Float(f)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::Text(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::Text(s)
    }
}

impl From<CalendarValue> for Document {
    fn from(value: CalendarValue) -> Self {
        Document::Calendar(value)
    }
}

impl<T: Into<Document>> From<Vec<T>> for Document {
    fn from(items: Vec<T>) -> Self {
        Document::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Document>> From<Option<T>> for Document {
    fn from(value: Option<T>) -> Self {
        value.map_or(Document::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn map_keeps_insertion_order() {
        let doc = Document::map([("z", Document::from(1i64)), ("a", Document::from(2i64))]);
        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(text, r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn tuple_serializes_as_array() {
        let doc = Document::tuple([Document::from("x"), Document::from(2i64)]);
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!(["x", 2]));
    }

    #[test]
    fn calendar_serializes_as_text() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let doc = Document::map([("at", Document::Calendar(date.into()))]);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"at": "1999-12-31"})
        );
    }

    #[test]
    fn from_json_value() {
        let doc = Document::from(json!({"a": [1, 2.5, null, "s", true]}));
        let expected = Document::Map(vec![(
            "a".to_string(),
            Document::Array(vec![
                Document::Integer(1),
                Document::Float(2.5),
                Document::Null,
                Document::Text("s".into()),
                Document::Bool(true),
            ]),
        )]);
        assert_eq!(doc, expected);
        assert!(doc.get("a").is_some());
        assert!(doc.get("b").is_none());
    }
}
