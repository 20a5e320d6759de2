//! Error types for engine operations.

use crate::backend::BackendKind;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while talking to a relational engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached or its file could not be opened.
    #[error("cannot open {backend} connection: {message}")]
    Connect {
        /// The engine that failed to open.
        backend: BackendKind,
        /// Description of the failure.
        message: String,
    },

    /// An error reported by SQLite.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error reported by PostgreSQL.
    #[error("postgres: {0}")]
    Postgres(#[from] postgres::Error),

    /// A result column has a server type with no column value mapping.
    #[error("column {column} has unsupported type {type_name}")]
    UnsupportedType {
        /// The column name.
        column: String,
        /// The server's name for the type.
        type_name: String,
    },
}

impl EngineError {
    /// Creates a connection error.
    pub fn connect(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::Connect {
            backend,
            message: message.into(),
        }
    }

    /// Returns true if this error happened while opening a connection.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}
