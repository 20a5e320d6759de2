//! # swapdb Engine
//!
//! Relational engines for swapdb.
//!
//! An [`Engine`] is one live connection to one relational database. The
//! rest of swapdb only talks to `Box<dyn Engine>`, so the embedded and the
//! networked engine are interchangeable at runtime.
//!
//! ## Design Principles
//!
//! - Engines are pass-through: SQL goes in verbatim, errors come out verbatim
//! - Values cross the boundary as [`ColumnValue`](swapdb_codec::ColumnValue)
//! - `$1..$n` placeholders work on every engine
//! - Engines know nothing about schemas or codecs
//!
//! ## Available Engines
//!
//! - [`SqliteEngine`] - embedded, file-backed (or in-memory for tests)
//! - [`PostgresEngine`] - networked PostgreSQL server
//!
//! ## Example
//!
//! ```rust
//! use swapdb_engine::{Engine, SqliteEngine};
//!
//! let mut engine: Box<dyn Engine> = Box::new(SqliteEngine::open_in_memory().unwrap());
//! engine.execute_batch("CREATE TABLE kv (k TEXT, v BLOB)").unwrap();
//! assert!(engine.table_exists("kv").unwrap());
//! engine.close().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod pg;
mod result;
mod sqlite;

pub use backend::{BackendKind, Engine};
pub use error::{EngineError, EngineResult};
pub use pg::{PostgresEngine, PostgresParams, DEFAULT_HOST, DEFAULT_PORT};
pub use result::ResultSet;
pub use sqlite::{SqliteEngine, SqliteOptions};
