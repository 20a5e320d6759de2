//! # swapdb Core
//!
//! A swappable persistence layer.
//!
//! [`SubstitutableDatabase`] binds an ordered list of [`Schema`]s to one of
//! two interchangeable engines, embedded SQLite or networked PostgreSQL,
//! and hands out pass-through access to it:
//!
//! - Backend selection from the environment ([`BackendConfig::from_env`])
//!   or from an explicit [`BackendConfig`]
//! - Idempotent table creation on every open and rebind
//! - Live rebinding to another file or server
//! - Raw statement execution, atomic blocks and transactions
//! - Space reclamation
//!
//! Column values are encoded with the codecs from
//! [`swapdb_codec`], re-exported here as [`codec`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod database;
mod error;
mod schema;
mod transaction;

pub use backend::{env, BackendConfig};
pub use config::Config;
pub use database::SubstitutableDatabase;
pub use error::{CoreError, CoreResult};
pub use schema::{Binding, Column, ColumnKind, Schema, Table};
pub use transaction::{ScopeKind, ScopedTransaction};

pub use swapdb_codec as codec;
pub use swapdb_codec::ColumnValue;
pub use swapdb_engine::{
    BackendKind, Engine, EngineError, PostgresParams, ResultSet, SqliteOptions,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
