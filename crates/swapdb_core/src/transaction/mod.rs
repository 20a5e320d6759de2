//! Scoped transactions and atomic blocks.
//!
//! Both engines support savepoints, so nesting is explicit and identical
//! on each:
//!
//! | opened from           | `atomic()`        | `transaction()`     |
//! |-----------------------|-------------------|---------------------|
//! | the database          | `BEGIN`           | `BEGIN`             |
//! | an open scope         | `SAVEPOINT`       | pass-through (no-op)|
//!
//! A pass-through scope commits and rolls back nothing; the enclosing
//! scope decides the outcome.

mod scope;

pub use scope::{ScopeKind, ScopedTransaction};

pub(crate) use scope::run_scope;
