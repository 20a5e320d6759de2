//! Database facade and backend switching.

use crate::backend::BackendConfig;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::schema::{Binding, Schema};
use crate::transaction::{run_scope, ScopeKind, ScopedTransaction};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use swapdb_codec::ColumnValue;
use swapdb_engine::{BackendKind, Engine, ResultSet};
use tracing::{debug, info, warn};

/// The application's single handle to whichever engine is active.
///
/// `SubstitutableDatabase` owns exactly one live connection. It binds the
/// schemas it was given to that connection, creates their tables, and can
/// later be pointed at a different file or server with
/// [`change_path`](Self::change_path).
///
/// # Opening a Database
///
/// ```
/// use std::sync::Arc;
/// use swapdb_core::{BackendConfig, Column, ColumnKind, Config, Schema, SubstitutableDatabase, Table};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("app.db");
/// let widget: Arc<dyn Schema> = Arc::new(
///     Table::new("widget")
///         .column(Column::id("id"))
///         .column(Column::new("name", ColumnKind::Text)),
/// );
///
/// let mut db = SubstitutableDatabase::open_with_config(
///     &path,
///     vec![widget],
///     BackendConfig::embedded(&path),
///     Config::default(),
/// )
/// .unwrap();
///
/// db.execute("INSERT INTO widget (name) VALUES ($1)", &["gear".into()]).unwrap();
/// let count = db.execute("SELECT count(*) FROM widget", &[]).unwrap();
/// assert_eq!(count.scalar().and_then(|v| v.as_integer()), Some(1));
/// ```
///
/// # Switching Backends
///
/// A rebind closes the current connection before opening the next one.
/// Every other operation needs `&mut self` or a scope borrowed from it, so
/// no statement can run in between. If the new backend cannot be opened
/// the old one is not restored: the database stays closed and every
/// operation returns [`CoreError::Closed`] until a later rebind succeeds.
pub struct SubstitutableDatabase {
    /// Target file; used by the embedded engine.
    path: PathBuf,
    /// Schemas bound on every (re)open, in creation order.
    schemas: Vec<Arc<dyn Schema>>,
    /// Engine selection in effect.
    backend: BackendConfig,
    /// Engine knobs.
    config: Config,
    /// The live connection. `None` only after a failed rebind or `close`.
    engine: Option<Box<dyn Engine>>,
    /// Incremented on every successful open.
    generation: u64,
}

impl SubstitutableDatabase {
    /// Opens the database at `path`, choosing the engine from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the environment enables the
    /// networked engine without its required settings,
    /// [`CoreError::Connection`] if the engine cannot be opened, or
    /// [`CoreError::Database`] if table creation fails.
    pub fn open(path: &Path, schemas: Vec<Arc<dyn Schema>>) -> CoreResult<Self> {
        let backend = BackendConfig::from_env(path)?;
        Self::open_with_config(path, schemas, backend, Config::default())
    }

    /// Opens the database with an explicit backend and configuration.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_config(
        path: &Path,
        schemas: Vec<Arc<dyn Schema>>,
        backend: BackendConfig,
        config: Config,
    ) -> CoreResult<Self> {
        let mut db = Self {
            path: path.to_path_buf(),
            schemas,
            backend,
            config,
            engine: None,
            generation: 0,
        };
        db.connect()?;
        Ok(db)
    }

    /// Resolves the backend the environment currently selects for this
    /// database's path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] if the networked engine is
    /// enabled without its required settings.
    pub fn resolve_backend_config(&self) -> CoreResult<BackendConfig> {
        BackendConfig::from_env(&self.path)
    }

    /// Points the database at `path`, re-resolving the engine from the
    /// environment.
    ///
    /// # Errors
    ///
    /// A configuration error leaves the current connection untouched. Any
    /// later error leaves the database closed.
    pub fn change_path(&mut self, path: &Path) -> CoreResult<()> {
        let backend = BackendConfig::from_env(path)?;
        self.change_path_with(path, backend)
    }

    /// Points the database at `path` using an explicit backend.
    ///
    /// # Errors
    ///
    /// Returns an error if closing the old engine or opening the new one
    /// fails; the database is then closed.
    pub fn change_path_with(&mut self, path: &Path, backend: BackendConfig) -> CoreResult<()> {
        self.close()?;
        self.path = path.to_path_buf();
        self.backend = backend;
        self.connect()
    }

    /// Opens the configured engine, binds every schema and creates tables.
    fn connect(&mut self) -> CoreResult<()> {
        match &self.backend {
            BackendConfig::Embedded { path } => {
                info!(backend = "sqlite", path = %path.display(), "Using SQLite driver");
            }
            BackendConfig::Networked(params) => {
                info!(
                    backend = "postgres",
                    database = %params.database,
                    user = %params.user,
                    "Using Postgres driver"
                );
            }
        }

        let mut engine = self.backend.connect(&self.config)?;
        let binding = Binding {
            backend: engine.kind(),
            target: engine.describe(),
            generation: self.generation + 1,
        };

        for schema in &self.schemas {
            schema.bind(&binding);
            debug!(table = schema.name(), backend = %binding.backend, "bound schema");
        }
        for schema in &self.schemas {
            if let Err(err) = schema.create_if_missing(engine.as_mut()) {
                self.unbind_all();
                return Err(CoreError::Database(err));
            }
        }

        self.generation = binding.generation;
        self.engine = Some(engine);
        Ok(())
    }

    fn unbind_all(&self) {
        for schema in &self.schemas {
            schema.unbind();
        }
    }

    /// Closes the connection and unbinds every schema.
    ///
    /// Closing an already closed database is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] if the engine reports an error while
    /// closing. The connection is gone either way.
    pub fn close(&mut self) -> CoreResult<()> {
        let Some(engine) = self.engine.take() else {
            return Ok(());
        };
        self.unbind_all();
        engine.close().map_err(CoreError::Database)
    }

    /// Checks if the database has a live connection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns the live connection for inspection.
    ///
    /// Only [`Engine::kind`] and [`Engine::describe`] take `&self`; running
    /// statements needs [`connection_mut`](Self::connection_mut).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] if there is none.
    pub fn connection(&self) -> CoreResult<&dyn Engine> {
        match &self.engine {
            Some(engine) => Ok(engine.as_ref()),
            None => Err(CoreError::Closed),
        }
    }

    /// Returns the live connection for direct use.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Closed`] if there is none.
    pub fn connection_mut(&mut self) -> CoreResult<&mut dyn Engine> {
        match &mut self.engine {
            Some(engine) => Ok(engine.as_mut()),
            None => Err(CoreError::Closed),
        }
    }

    /// Executes one statement on the active engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] carrying the engine's error, or
    /// [`CoreError::Closed`].
    pub fn execute(&mut self, sql: &str, params: &[ColumnValue]) -> CoreResult<ResultSet> {
        self.connection_mut()?
            .execute(sql, params)
            .map_err(CoreError::Database)
    }

    /// Executes parameterless statements on the active engine.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] or [`CoreError::Closed`].
    pub fn execute_batch(&mut self, sql: &str) -> CoreResult<()> {
        self.connection_mut()?
            .execute_batch(sql)
            .map_err(CoreError::Database)
    }

    /// Begins an atomic block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] if the engine refuses to begin, or
    /// [`CoreError::Closed`].
    pub fn atomic(&mut self) -> CoreResult<ScopedTransaction<'_>> {
        ScopedTransaction::begin(self.connection_mut()?, ScopeKind::Atomic)
    }

    /// Begins a plain transaction.
    ///
    /// # Errors
    ///
    /// See [`atomic`](Self::atomic).
    pub fn transaction(&mut self) -> CoreResult<ScopedTransaction<'_>> {
        ScopedTransaction::begin(self.connection_mut()?, ScopeKind::Transaction)
    }

    /// Executes a function within an atomic block.
    ///
    /// If the function returns `Ok`, the block is committed.
    /// If it returns `Err` or panics, the block is rolled back.
    ///
    /// # Errors
    ///
    /// Returns the function's error, or the error from beginning or
    /// committing the block.
    pub fn run_atomic<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ScopedTransaction<'_>) -> Result<T, E>,
        E: From<CoreError>,
    {
        run_scope(self.atomic()?, f)
    }

    /// Executes a function within a plain transaction.
    ///
    /// # Errors
    ///
    /// See [`run_atomic`](Self::run_atomic).
    pub fn run_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut ScopedTransaction<'_>) -> Result<T, E>,
        E: From<CoreError>,
    {
        run_scope(self.transaction()?, f)
    }

    /// Reclaims unused space in the active engine.
    ///
    /// Callers must not hold an open scope; the borrow checker enforces
    /// this for scopes obtained from this database.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Database`] or [`CoreError::Closed`].
    pub fn vacuum(&mut self) -> CoreResult<()> {
        let engine = self.connection_mut()?;
        info!(target_db = %engine.describe(), "Vacuuming database");
        engine.reclaim_space().map_err(CoreError::Database)
    }

    /// Returns the current path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the engine kind in effect.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Returns the backend configuration in effect.
    #[must_use]
    pub fn backend_config(&self) -> &BackendConfig {
        &self.backend
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the bound schemas in creation order.
    #[must_use]
    pub fn schemas(&self) -> &[Arc<dyn Schema>] {
        &self.schemas
    }

    /// Returns the connection counter; grows on every successful open.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for SubstitutableDatabase {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!(error = %err, "closing database on drop failed");
        }
    }
}

impl fmt::Debug for SubstitutableDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubstitutableDatabase")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("open", &self.is_open())
            .field("schemas", &self.schemas.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnKind, Table};
    use tempfile::TempDir;

    fn widget() -> Arc<Table> {
        Arc::new(
            Table::new("widget")
                .column(Column::id("id"))
                .column(Column::new("name", ColumnKind::Text)),
        )
    }

    fn dynamic(table: &Arc<Table>) -> Arc<dyn Schema> {
        table.clone()
    }

    fn create_db(dir: &TempDir, schemas: Vec<Arc<dyn Schema>>) -> SubstitutableDatabase {
        let path = dir.path().join("test.db");
        SubstitutableDatabase::open_with_config(
            &path,
            schemas,
            BackendConfig::embedded(&path),
            Config::default(),
        )
        .unwrap()
    }

    fn count(db: &mut SubstitutableDatabase, table: &str) -> i64 {
        db.execute(&format!("SELECT count(*) FROM {table}"), &[])
            .unwrap()
            .scalar()
            .and_then(ColumnValue::as_integer)
            .unwrap()
    }

    #[test]
    fn open_creates_tables_and_binds() {
        let dir = tempfile::tempdir().unwrap();
        let table = widget();
        let mut db = create_db(&dir, vec![dynamic(&table)]);

        assert!(db.is_open());
        assert_eq!(db.backend_kind(), BackendKind::Sqlite);
        assert!(db.connection_mut().unwrap().table_exists("widget").unwrap());
        assert_eq!(count(&mut db, "widget"), 0);

        let binding = table.binding().unwrap();
        assert_eq!(binding.backend, BackendKind::Sqlite);
        assert_eq!(binding.generation, 1);
    }

    type CreationLog = Arc<parking_lot::Mutex<Vec<(String, bool)>>>;

    /// Wraps a table and records, on creation, whether every table it
    /// references already existed.
    struct Recording {
        table: Table,
        log: CreationLog,
    }

    impl Schema for Recording {
        fn name(&self) -> &str {
            self.table.name()
        }

        fn create_sql(&self, backend: BackendKind) -> String {
            self.table.create_sql(backend)
        }

        fn bind(&self, binding: &Binding) {
            self.table.bind(binding);
        }

        fn unbind(&self) {
            self.table.unbind();
        }

        fn binding(&self) -> Option<Binding> {
            self.table.binding()
        }

        fn create_if_missing(&self, engine: &mut dyn Engine) -> swapdb_engine::EngineResult<()> {
            let mut parents_exist = true;
            for parent in self.table.references() {
                parents_exist &= engine.table_exists(parent)?;
            }
            self.log
                .lock()
                .push((self.table.name().to_string(), parents_exist));
            self.table.create_if_missing(engine)
        }
    }

    fn parent_and_child(log: &CreationLog) -> (Arc<dyn Schema>, Arc<dyn Schema>) {
        let parent = Recording {
            table: Table::new("parent").column(Column::id("id")),
            log: log.clone(),
        };
        let child = Recording {
            table: Table::new("child")
                .column(Column::id("id"))
                .column(Column::new("parent", ColumnKind::ForeignKey("parent".into()))),
            log: log.clone(),
        };
        (Arc::new(parent), Arc::new(child))
    }

    fn open_with_foreign_keys(dir: &TempDir, schemas: Vec<Arc<dyn Schema>>) -> SubstitutableDatabase {
        let path = dir.path().join("fk.db");
        SubstitutableDatabase::open_with_config(
            &path,
            schemas,
            BackendConfig::embedded(&path),
            Config::default().foreign_keys(true),
        )
        .unwrap()
    }

    #[test]
    fn tables_created_in_schema_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = CreationLog::default();
        let (parent, child) = parent_and_child(&log);
        let mut db = open_with_foreign_keys(&dir, vec![parent, child]);

        assert_eq!(
            *log.lock(),
            vec![("parent".to_string(), true), ("child".to_string(), true)]
        );

        db.execute("INSERT INTO parent (id) VALUES ($1)", &[1i64.into()])
            .unwrap();
        db.execute("INSERT INTO child (parent) VALUES ($1)", &[1i64.into()])
            .unwrap();
        let err = db
            .execute("INSERT INTO child (parent) VALUES ($1)", &[99i64.into()])
            .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("foreign key"));
    }

    #[test]
    fn reversed_schema_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let log = CreationLog::default();
        let (parent, child) = parent_and_child(&log);
        let _db = open_with_foreign_keys(&dir, vec![child, parent]);

        assert_eq!(
            *log.lock(),
            vec![("child".to_string(), false), ("parent".to_string(), true)]
        );
    }

    #[test]
    fn binding_does_not_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let parent = Arc::new(Table::new("parent").column(Column::id("id")));
        let child = Arc::new(
            Table::new("child")
                .column(Column::id("id"))
                .column(Column::new("parent", ColumnKind::ForeignKey("parent".into()))),
        );
        let _db = create_db(&dir, vec![dynamic(&child)]);

        assert!(child.binding().is_some());
        assert!(parent.binding().is_none());
    }

    #[test]
    fn rebind_moves_to_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let table = widget();
        let mut db = create_db(&dir, vec![dynamic(&table)]);
        db.execute("INSERT INTO widget (name) VALUES ($1)", &["old".into()])
            .unwrap();

        let other = dir.path().join("other.db");
        db.change_path_with(&other, BackendConfig::embedded(&other))
            .unwrap();

        assert_eq!(db.path(), other.as_path());
        assert_eq!(count(&mut db, "widget"), 0);
        assert_eq!(table.binding().unwrap().generation, 2);
        assert!(table.binding().unwrap().target.contains("other.db"));
    }

    #[test]
    fn failed_rebind_leaves_database_closed() {
        let dir = tempfile::tempdir().unwrap();
        let table = widget();
        let mut db = create_db(&dir, vec![dynamic(&table)]);

        let bad = dir.path().join("missing").join("x.db");
        let err = db
            .change_path_with(&bad, BackendConfig::embedded(&bad))
            .unwrap_err();
        assert!(err.is_connection());
        assert!(!db.is_open());
        assert!(table.binding().is_none());
        assert!(matches!(db.execute("SELECT 1", &[]), Err(CoreError::Closed)));
        assert!(matches!(db.atomic(), Err(CoreError::Closed)));
        assert!(matches!(db.vacuum(), Err(CoreError::Closed)));

        let good = dir.path().join("good.db");
        db.change_path_with(&good, BackendConfig::embedded(&good))
            .unwrap();
        assert!(db.is_open());
        assert_eq!(count(&mut db, "widget"), 0);
    }

    #[test]
    fn shared_connection_describes_engine() {
        let dir = tempfile::tempdir().unwrap();
        let db = create_db(&dir, vec![dynamic(&widget())]);
        let engine = db.connection().unwrap();
        assert_eq!(engine.kind(), BackendKind::Sqlite);
        assert!(engine.describe().ends_with("test.db"));
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = create_db(&dir, vec![dynamic(&widget())]);
        db.close().unwrap();
        db.close().unwrap();
        assert!(!db.is_open());
        assert!(db.connection().is_err());
    }

    #[test]
    fn execute_errors_are_database_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = create_db(&dir, vec![dynamic(&widget())]);
        let err = db.execute("SELECT * FROM gadget", &[]).unwrap_err();
        assert!(err.is_database());
        assert!(err.to_string().contains("gadget"));
    }

    #[test]
    fn run_atomic_commits_and_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = create_db(&dir, vec![dynamic(&widget())]);

        db.run_atomic(|tx| -> CoreResult<()> {
            tx.execute("INSERT INTO widget (name) VALUES ($1)", &["a".into()])?;
            Ok(())
        })
        .unwrap();

        let result: CoreResult<()> = db.run_transaction(|tx| {
            tx.execute("INSERT INTO widget (name) VALUES ($1)", &["b".into()])?;
            Err(CoreError::configuration("abort"))
        });
        assert!(result.is_err());
        assert_eq!(count(&mut db, "widget"), 1);
    }

    #[test]
    fn vacuum_runs() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = create_db(&dir, vec![dynamic(&widget())]);
        db.vacuum().unwrap();
    }

    #[test]
    fn debug_lists_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let db = create_db(&dir, vec![dynamic(&widget())]);
        let shown = format!("{db:?}");
        assert!(shown.contains("widget"));
        assert!(shown.contains("open: true"));
    }
}
