//! # swapdb Codec
//!
//! Column codecs for swapdb.
//!
//! A codec turns an in-memory value into a single [`ColumnValue`] on write
//! and back on read. Three codecs are provided:
//!
//! - [`BinaryCodec`] - any serde value as a versioned binary blob; exact
//!   round trip
//! - [`JsonCodec`] - indented, human-readable JSON text; decodes to the
//!   generic `serde_json::Value`, so calendar values come back as text
//! - [`TupleJsonCodec`] - like [`JsonCodec`], but a top-level sequence is
//!   restored as a tuple and `null` as absence
//!
//! [`Nullable`] adapts any codec to a nullable column.
//!
//! ## Usage
//!
//! ```
//! use swapdb_codec::{BinaryCodec, FieldCodec};
//!
//! let codec = BinaryCodec::<(String, i64)>::new();
//! let stored = codec.encode(&("kg".to_string(), 3)).unwrap();
//! let decoded = codec.decode(&stored).unwrap();
//! assert_eq!(decoded, ("kg".to_string(), 3));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod binary;
pub mod calendar;
mod document;
mod error;
mod nullable;
mod text;
mod value;

pub use binary::{from_blob, to_blob, BinaryCodec, HEADER_LEN, MAGIC, PROTOCOL_VERSION};
pub use calendar::{Calendar, CalendarText, CalendarValue};
pub use document::Document;
pub use error::{CodecError, CodecResult};
pub use nullable::Nullable;
pub use text::{from_json_text, to_json_text, Json, JsonCodec, JsonEncode, Restored, TupleJsonCodec};
pub use value::ColumnValue;

/// Storage class a codec writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Raw bytes (`BLOB` / `BYTEA`).
    Blob,
    /// Text (`TEXT`).
    Text,
}

/// A paired encode/decode contract for one logical column type.
///
/// `encode` either produces the complete column value or fails; it never
/// yields a partial value. `Input` and `Output` differ for the text codecs,
/// which read back the generic structured form rather than the written type.
pub trait FieldCodec {
    /// The type accepted on write.
    type Input: ?Sized;
    /// The type produced on read.
    type Output;

    /// Storage class of the encoded value.
    fn storage(&self) -> Storage;

    /// Encode a value into a column value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] if the value cannot be represented.
    fn encode(&self, value: &Self::Input) -> CodecResult<ColumnValue>;

    /// Decode a stored column value.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the stored value is malformed.
    fn decode(&self, column: &ColumnValue) -> CodecResult<Self::Output>;
}
