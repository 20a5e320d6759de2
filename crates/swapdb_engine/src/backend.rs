//! Engine trait definition.

use crate::error::EngineResult;
use crate::result::ResultSet;
use std::fmt;
use swapdb_codec::ColumnValue;

/// The relational engines a database can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Embedded, file-backed SQLite.
    Sqlite,
    /// Networked PostgreSQL server.
    Postgres,
}

impl BackendKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Column definition for an auto-incrementing primary key.
    #[must_use]
    pub const fn auto_id_type(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER PRIMARY KEY",
            Self::Postgres => "BIGSERIAL PRIMARY KEY",
        }
    }

    /// Column type for 64-bit integers.
    #[must_use]
    pub const fn integer_type(self) -> &'static str {
        match self {
            Self::Sqlite => "INTEGER",
            Self::Postgres => "BIGINT",
        }
    }

    /// Column type for double precision floats.
    #[must_use]
    pub const fn real_type(self) -> &'static str {
        match self {
            Self::Sqlite => "REAL",
            Self::Postgres => "DOUBLE PRECISION",
        }
    }

    /// Column type for raw bytes.
    #[must_use]
    pub const fn blob_type(self) -> &'static str {
        match self {
            Self::Sqlite => "BLOB",
            Self::Postgres => "BYTEA",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A live connection to one relational engine.
///
/// Engines are pass-through: statements and their errors reach the caller
/// unchanged. Placeholders are written `$1..$n` on every engine.
///
/// # Invariants
///
/// - `execute` runs exactly one statement
/// - `execute_batch` runs any number of statements without parameters
/// - After `close` the connection is gone; there is no reopen
///
/// # Implementors
///
/// - [`super::SqliteEngine`] - embedded file or in-memory database
/// - [`super::PostgresEngine`] - networked server
pub trait Engine: Send {
    /// Returns which engine this is.
    fn kind(&self) -> BackendKind;

    /// Human-readable target description. Never contains credentials.
    fn describe(&self) -> String;

    /// Executes one statement with positional parameters.
    ///
    /// Statements that return rows yield them in the result set; other
    /// statements report the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim if preparing or running the
    /// statement fails.
    fn execute(&mut self, sql: &str, params: &[ColumnValue]) -> EngineResult<ResultSet>;

    /// Executes one or more statements that take no parameters.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim.
    fn execute_batch(&mut self, sql: &str) -> EngineResult<()>;

    /// Checks whether a table with the given name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn table_exists(&mut self, name: &str) -> EngineResult<bool>;

    /// Lists user tables in name order.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    fn table_names(&mut self) -> EngineResult<Vec<String>>;

    /// Reclaims unused space.
    ///
    /// Must not be called while a transaction is open.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim.
    fn reclaim_space(&mut self) -> EngineResult<()> {
        self.execute_batch("VACUUM")
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine reports a failure while closing.
    fn close(self: Box<Self>) -> EngineResult<()>;
}
