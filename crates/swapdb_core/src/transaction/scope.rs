//! The scoped transaction handle.

use crate::error::{CoreError, CoreResult};
use swapdb_codec::ColumnValue;
use swapdb_engine::{Engine, EngineResult, ResultSet};
use tracing::warn;

/// How a scope was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// An atomic block; nests as a savepoint.
    Atomic,
    /// A plain transaction; nests as a pass-through.
    Transaction,
}

/// What the scope issued on entry, and so what it must undo.
#[derive(Debug)]
enum Frame {
    Transaction,
    Savepoint(String),
    PassThrough,
}

/// A transaction or savepoint held open on the active engine.
///
/// Ends with [`commit`](Self::commit) or [`rollback`](Self::rollback).
/// Dropped without either (an early return or a panic) it rolls back.
///
/// The scope borrows the database mutably, so the database cannot be
/// rebound or vacuumed while it is open.
#[must_use = "a scope rolls back when dropped without commit"]
pub struct ScopedTransaction<'a> {
    engine: &'a mut dyn Engine,
    kind: ScopeKind,
    depth: usize,
    frame: Frame,
    finished: bool,
}

impl<'a> ScopedTransaction<'a> {
    /// Opens an outermost scope.
    pub(crate) fn begin(engine: &'a mut dyn Engine, kind: ScopeKind) -> CoreResult<Self> {
        engine.execute_batch("BEGIN").map_err(CoreError::Database)?;
        Ok(Self {
            engine,
            kind,
            depth: 0,
            frame: Frame::Transaction,
            finished: false,
        })
    }

    fn nested(&mut self, kind: ScopeKind) -> CoreResult<ScopedTransaction<'_>> {
        let depth = self.depth + 1;
        let frame = match kind {
            ScopeKind::Atomic => {
                let name = format!("swapdb_sp{depth}");
                self.engine
                    .execute_batch(&format!("SAVEPOINT {name}"))
                    .map_err(CoreError::Database)?;
                Frame::Savepoint(name)
            }
            ScopeKind::Transaction => Frame::PassThrough,
        };
        Ok(ScopedTransaction {
            engine: &mut *self.engine,
            kind,
            depth,
            frame,
            finished: false,
        })
    }

    /// Opens a nested atomic block as a savepoint.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] if the savepoint cannot be created.
    pub fn atomic(&mut self) -> CoreResult<ScopedTransaction<'_>> {
        self.nested(ScopeKind::Atomic)
    }

    /// Opens a nested pass-through scope.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches [`atomic`](Self::atomic).
    pub fn transaction(&mut self) -> CoreResult<ScopedTransaction<'_>> {
        self.nested(ScopeKind::Transaction)
    }

    /// Runs `f` in a nested atomic block, committing on `Ok`.
    ///
    /// # Errors
    ///
    /// Returns the closure's error after rolling the savepoint back.
    pub fn run_atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ScopedTransaction<'_>) -> Result<T, E>,
        E: From<CoreError>,
    {
        run_scope(self.atomic()?, f)
    }

    /// Runs `f` in a nested pass-through scope.
    ///
    /// # Errors
    ///
    /// Returns the closure's error unchanged.
    pub fn run_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ScopedTransaction<'_>) -> Result<T, E>,
        E: From<CoreError>,
    {
        run_scope(self.transaction()?, f)
    }

    /// Executes one statement inside the scope.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] with the engine's error.
    pub fn execute(&mut self, sql: &str, params: &[ColumnValue]) -> CoreResult<ResultSet> {
        self.engine.execute(sql, params).map_err(CoreError::Database)
    }

    /// Executes parameterless statements inside the scope.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] with the engine's error.
    pub fn execute_batch(&mut self, sql: &str) -> CoreResult<()> {
        self.engine.execute_batch(sql).map_err(CoreError::Database)
    }

    /// Returns the engine the scope runs on.
    pub fn connection(&mut self) -> &mut dyn Engine {
        &mut *self.engine
    }

    /// How the scope was requested.
    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Nesting depth; 0 for the outermost scope.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if this scope owns a savepoint.
    #[must_use]
    pub fn is_savepoint(&self) -> bool {
        matches!(self.frame, Frame::Savepoint(_))
    }

    /// Returns true if commit and rollback are no-ops for this scope.
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(self.frame, Frame::PassThrough)
    }

    /// Commits the scope.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] if the engine rejects the commit;
    /// the scope is then rolled back.
    pub fn commit(mut self) -> CoreResult<()> {
        let sql = match &self.frame {
            Frame::Transaction => Some("COMMIT".to_string()),
            Frame::Savepoint(name) => Some(format!("RELEASE SAVEPOINT {name}")),
            Frame::PassThrough => None,
        };
        if let Some(sql) = sql {
            self.engine.execute_batch(&sql).map_err(CoreError::Database)?;
        }
        self.finished = true;
        Ok(())
    }

    /// Rolls the scope back.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] if the engine rejects the rollback.
    pub fn rollback(mut self) -> CoreResult<()> {
        self.finished = true;
        self.undo().map_err(CoreError::Database)
    }

    fn undo(&mut self) -> EngineResult<()> {
        let sql = match &self.frame {
            Frame::Transaction => "ROLLBACK".to_string(),
            Frame::Savepoint(name) => {
                format!("ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}")
            }
            Frame::PassThrough => return Ok(()),
        };
        self.engine.execute_batch(&sql)
    }
}

impl Drop for ScopedTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.undo() {
            warn!(depth = self.depth, error = %err, "rollback of abandoned scope failed");
        }
    }
}

impl std::fmt::Debug for ScopedTransaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTransaction")
            .field("kind", &self.kind)
            .field("depth", &self.depth)
            .field("frame", &self.frame)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Runs `f` in `scope`: commit on `Ok`, roll back on `Err`.
pub(crate) fn run_scope<T, E, F>(mut scope: ScopedTransaction<'_>, f: F) -> Result<T, E>
where
    F: FnOnce(&mut ScopedTransaction<'_>) -> Result<T, E>,
    E: From<CoreError>,
{
    match f(&mut scope) {
        Ok(value) => {
            scope.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = scope.rollback() {
                warn!(error = %rollback, "rollback after failed scope failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swapdb_engine::SqliteEngine;

    fn engine() -> SqliteEngine {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        engine.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        engine
    }

    fn count(engine: &mut SqliteEngine) -> i64 {
        engine
            .execute("SELECT count(*) FROM t", &[])
            .unwrap()
            .scalar()
            .and_then(ColumnValue::as_integer)
            .unwrap()
    }

    fn insert(scope: &mut ScopedTransaction<'_>, v: i64) {
        scope
            .execute("INSERT INTO t (v) VALUES ($1)", &[v.into()])
            .unwrap();
    }

    #[test]
    fn commit_persists() {
        let mut engine = engine();
        let mut scope = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        insert(&mut scope, 1);
        scope.commit().unwrap();
        assert_eq!(count(&mut engine), 1);
    }

    #[test]
    fn rollback_discards() {
        let mut engine = engine();
        let mut scope = ScopedTransaction::begin(&mut engine, ScopeKind::Transaction).unwrap();
        insert(&mut scope, 1);
        scope.rollback().unwrap();
        assert_eq!(count(&mut engine), 0);
    }

    #[test]
    fn drop_rolls_back() {
        let mut engine = engine();
        {
            let mut scope = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
            insert(&mut scope, 1);
        }
        assert_eq!(count(&mut engine), 0);
    }

    #[test]
    fn nested_atomic_is_savepoint() {
        let mut engine = engine();
        let mut outer = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        insert(&mut outer, 1);
        {
            let mut inner = outer.atomic().unwrap();
            assert!(inner.is_savepoint());
            assert_eq!(inner.depth(), 1);
            insert(&mut inner, 2);
            inner.rollback().unwrap();
        }
        {
            let mut inner = outer.atomic().unwrap();
            insert(&mut inner, 3);
            inner.commit().unwrap();
        }
        outer.commit().unwrap();

        let rs = engine.execute("SELECT v FROM t ORDER BY v", &[]).unwrap();
        let values: Vec<_> = rs.iter().filter_map(|r| r[0].as_integer()).collect();
        assert_eq!(values, vec![1, 3]);
    }

    #[test]
    fn nested_transaction_is_pass_through() {
        let mut engine = engine();
        let mut outer = ScopedTransaction::begin(&mut engine, ScopeKind::Transaction).unwrap();
        {
            let mut inner = outer.transaction().unwrap();
            assert!(inner.is_pass_through());
            insert(&mut inner, 1);
            // A pass-through rollback leaves the outer scope in charge.
            inner.rollback().unwrap();
        }
        outer.commit().unwrap();
        assert_eq!(count(&mut engine), 1);
    }

    #[test]
    fn outer_rollback_discards_released_savepoint() {
        let mut engine = engine();
        let mut outer = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        {
            let mut inner = outer.atomic().unwrap();
            insert(&mut inner, 1);
            inner.commit().unwrap();
        }
        outer.rollback().unwrap();
        assert_eq!(count(&mut engine), 0);
    }

    #[test]
    fn run_scope_commits_on_ok() {
        let mut engine = engine();
        let scope = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        let value = run_scope(scope, |tx| -> CoreResult<i64> {
            insert(tx, 5);
            Ok(5)
        })
        .unwrap();
        assert_eq!(value, 5);
        assert_eq!(count(&mut engine), 1);
    }

    #[test]
    fn run_scope_rolls_back_on_err() {
        let mut engine = engine();
        let scope = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        let result = run_scope(scope, |tx| -> CoreResult<()> {
            insert(tx, 5);
            tx.execute("INSERT INTO missing (v) VALUES (1)", &[])?;
            Ok(())
        });
        assert!(result.unwrap_err().is_database());
        assert_eq!(count(&mut engine), 0);
    }

    #[test]
    fn nested_run_atomic_keeps_outer_work() {
        let mut engine = engine();
        let scope = ScopedTransaction::begin(&mut engine, ScopeKind::Atomic).unwrap();
        run_scope(scope, |tx| -> CoreResult<()> {
            insert(tx, 1);
            let inner: CoreResult<()> = tx.run_atomic(|inner| {
                insert(inner, 2);
                Err(CoreError::configuration("abandon inner"))
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&mut engine), 1);
    }
}
