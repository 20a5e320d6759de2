//! Versioned binary codec.
//!
//! Blobs start with a two byte header: a magic byte and the protocol
//! version. The payload is a single CBOR item. The protocol version is
//! pinned, never "latest", so blobs written by one release stay readable
//! by the next.

use crate::error::{CodecError, CodecResult};
use crate::value::ColumnValue;
use crate::{FieldCodec, Storage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// First byte of every binary blob.
pub const MAGIC: u8 = 0xB5;

/// The pinned binary protocol version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Length of the blob header in bytes.
pub const HEADER_LEN: usize = 2;

/// Serialize a value into a versioned binary blob.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the value cannot be serialized.
pub fn to_blob<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    let mut out = vec![MAGIC, PROTOCOL_VERSION];
    ciborium::ser::into_writer(value, &mut out).map_err(|e| CodecError::encode(e.to_string()))?;
    Ok(out)
}

/// Deserialize a value from a versioned binary blob.
///
/// # Errors
///
/// Returns a decode error if the header is missing or malformed, the
/// protocol version is not the pinned one, the payload is not valid CBOR
/// for `T`, or bytes remain after the payload.
pub fn from_blob<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::decode(format!(
            "blob of {} bytes is shorter than the {HEADER_LEN} byte header",
            bytes.len()
        )));
    }
    if bytes[0] != MAGIC {
        return Err(CodecError::decode(format!(
            "bad magic byte 0x{:02x}",
            bytes[0]
        )));
    }
    if bytes[1] != PROTOCOL_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: bytes[1],
            expected: PROTOCOL_VERSION,
        });
    }

    let mut payload = &bytes[HEADER_LEN..];
    let value = ciborium::de::from_reader(&mut payload)
        .map_err(|e| CodecError::decode(e.to_string()))?;

    if !payload.is_empty() {
        return Err(CodecError::decode(format!(
            "{} trailing bytes after payload",
            payload.len()
        )));
    }

    Ok(value)
}

/// Codec that stores any serde value as a versioned binary blob.
///
/// Round-trips nested containers, enums, tuples and maps with non-string
/// keys. SQL `NULL` is not a valid stored value; wrap the codec in
/// [`Nullable`](crate::Nullable) for nullable columns.
pub struct BinaryCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BinaryCodec<T> {
    /// Creates a new binary codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BinaryCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BinaryCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BinaryCodec<T> {}

impl<T> fmt::Debug for BinaryCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryCodec")
            .field("protocol", &PROTOCOL_VERSION)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> FieldCodec for BinaryCodec<T> {
    type Input = T;
    type Output = T;

    fn storage(&self) -> Storage {
        Storage::Blob
    }

    fn encode(&self, value: &T) -> CodecResult<ColumnValue> {
        to_blob(value).map(ColumnValue::Blob)
    }

    fn decode(&self, column: &ColumnValue) -> CodecResult<T> {
        match column {
            ColumnValue::Blob(bytes) => from_blob(bytes),
            other => Err(CodecError::UnexpectedColumn {
                expected: "blob",
                found: other.kind(),
            }),
        }
    }
}
