//! Error types for swapdb core.

use swapdb_codec::CodecError;
use swapdb_engine::EngineError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in swapdb core operations.
///
/// The variants keep the four failure classes apart: bad configuration,
/// an unreachable engine, a failing statement, and a malformed column
/// value. Engine messages are carried through unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backend configuration is incomplete or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// The engine could not be reached or its file could not be opened.
    #[error("connection error: {0}")]
    Connection(#[source] EngineError),

    /// A pass-through statement or transaction command failed.
    #[error("database error: {0}")]
    Database(#[source] EngineError),

    /// A column value could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The database has no connection, e.g. after a failed rebind.
    #[error("database is closed")]
    Closed,
}

impl CoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a configuration error for a required variable that is unset.
    pub fn missing_variable(name: &str) -> Self {
        Self::configuration(format!("{name} must be set when PostgreSQL is enabled"))
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for connection errors.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns true for statement errors.
    #[must_use]
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns true if a stored column value was malformed.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Codec(e) if e.is_decode())
    }
}

impl From<EngineError> for CoreError {
    fn from(err: EngineError) -> Self {
        if err.is_connect() {
            Self::Connection(err)
        } else {
            Self::Database(err)
        }
    }
}
