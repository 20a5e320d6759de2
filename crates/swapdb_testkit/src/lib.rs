//! # swapdb Testkit
//!
//! Test utilities for swapdb.
//!
//! This crate provides:
//! - Temporary SQLite databases and the `widget` fixture schema
//! - A process-wide lock for tests that change environment variables
//! - Capture of `tracing` output for asserting on log events
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use swapdb_testkit::prelude::*;
//!
//! with_temp_db(vec![widget_schema()], |db| {
//!     db.execute("INSERT INTO widget (name) VALUES ($1)", &["gear".into()]).unwrap();
//!     assert_eq!(count_rows(db, "widget"), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod fixtures;
pub mod generators;
pub mod logs;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::env::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logs::*;
}

pub use env::*;
pub use fixtures::*;
pub use generators::*;
pub use logs::*;
