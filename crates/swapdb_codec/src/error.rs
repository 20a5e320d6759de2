//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a column value.
///
/// Encoding errors are raised before any column value is produced, so a
/// failed encode never leaves a partial value behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The value could not be serialized.
    #[error("encoding failed: {message}")]
    Encode {
        /// Description of the encoding error.
        message: String,
    },

    /// The stored column value is malformed.
    #[error("decoding failed: {message}")]
    Decode {
        /// Description of the decoding error.
        message: String,
    },

    /// The stored column holds a different storage class than the codec reads.
    #[error("unexpected column value: expected {expected}, found {found}")]
    UnexpectedColumn {
        /// Storage class the codec reads.
        expected: &'static str,
        /// Storage class that was found.
        found: &'static str,
    },

    /// The binary blob was written with a protocol this build cannot read.
    #[error("unsupported binary protocol version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version byte found in the blob header.
        found: u8,
        /// The pinned protocol version.
        expected: u8,
    },
}

impl CodecError {
    /// Create an encoding error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a decoding error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if this error was raised while reading a stored value.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        !matches!(self, Self::Encode { .. })
    }
}
