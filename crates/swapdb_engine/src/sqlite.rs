//! Embedded SQLite engine.

use crate::backend::{BackendKind, Engine};
use crate::error::{EngineError, EngineResult};
use crate::result::ResultSet;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swapdb_codec::ColumnValue;
use tracing::debug;

/// Connection options for the embedded engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    /// How long to wait on a locked database before failing.
    pub busy_timeout: Duration,
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
    /// Create missing parent directories before opening.
    pub create_dirs: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            foreign_keys: false,
            create_dirs: false,
        }
    }
}

impl SqliteOptions {
    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Enables or disables foreign key enforcement.
    #[must_use]
    pub const fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Enables or disables creation of missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, enabled: bool) -> Self {
        self.create_dirs = enabled;
        self
    }
}

/// An embedded SQLite database.
///
/// Backed by a file, or by memory for tests. `$N` placeholders are
/// rewritten to SQLite's `?N` form before preparing, so parameter order
/// matches PostgreSQL.
///
/// # Example
///
/// ```
/// use swapdb_engine::{Engine, SqliteEngine};
///
/// let mut engine = SqliteEngine::open_in_memory().unwrap();
/// engine.execute_batch("CREATE TABLE t (v TEXT)").unwrap();
/// engine.execute("INSERT INTO t (v) VALUES ($1)", &["x".into()]).unwrap();
/// let rs = engine.execute("SELECT count(*) FROM t", &[]).unwrap();
/// assert_eq!(rs.scalar().and_then(|v| v.as_integer()), Some(1));
/// ```
#[derive(Debug)]
pub struct SqliteEngine {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteEngine {
    /// Opens or creates a database file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connect`] if the file cannot be opened or is
    /// not a SQLite database.
    pub fn open(path: &Path, options: &SqliteOptions) -> EngineResult<Self> {
        let unopenable = |e: &dyn std::fmt::Display| {
            EngineError::connect(BackendKind::Sqlite, format!("{}: {e}", path.display()))
        };

        if options.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| unopenable(&e))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| unopenable(&e))?;
        // Reading the header catches files that exist but are not databases.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| unopenable(&e))?;

        let engine = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        engine.configure(options)?;
        debug!(path = %path.display(), "opened sqlite database");
        Ok(engine)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connect`] if SQLite cannot allocate it.
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| EngineError::connect(BackendKind::Sqlite, e.to_string()))?;
        let engine = Self { conn, path: None };
        engine.configure(&SqliteOptions::default())?;
        Ok(engine)
    }

    fn configure(&self, options: &SqliteOptions) -> EngineResult<()> {
        self.conn.busy_timeout(options.busy_timeout)?;
        self.conn
            .pragma_update(None, "foreign_keys", options.foreign_keys)?;
        Ok(())
    }

    /// Returns the database file path, or `None` for in-memory databases.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the underlying rusqlite connection.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Engine for SqliteEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("sqlite {}", path.display()),
            None => "sqlite :memory:".to_string(),
        }
    }

    fn execute(&mut self, sql: &str, params: &[ColumnValue]) -> EngineResult<ResultSet> {
        let sql = numbered_placeholders(sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let bound = rusqlite::params_from_iter(params.iter().map(Param));

        if stmt.column_count() == 0 {
            let changed = stmt.execute(bound)?;
            return Ok(ResultSet::affected(changed as u64));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut rows = stmt.query(bound)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(column_value(row.get_ref(i)?)?);
            }
            out.push(values);
        }
        Ok(ResultSet::new(columns, out))
    }

    fn execute_batch(&mut self, sql: &str) -> EngineResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn table_exists(&mut self, name: &str) -> EngineResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn table_names(&mut self) -> EngineResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        let path = self.path.clone();
        self.conn.close().map_err(|(_, e)| EngineError::Sqlite(e))?;
        if let Some(path) = path {
            debug!(path = %path.display(), "closed sqlite database");
        }
        Ok(())
    }
}

/// Borrowed parameter binding for a column value.
struct Param<'a>(&'a ColumnValue);

impl ToSql for Param<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self.0 {
            ColumnValue::Null => ValueRef::Null,
            ColumnValue::Integer(n) => ValueRef::Integer(*n),
            ColumnValue::Real(f) => ValueRef::Real(*f),
            ColumnValue::Text(s) => ValueRef::Text(s.as_bytes()),
            ColumnValue::Blob(b) => ValueRef::Blob(b),
        }))
    }
}

/// Converts a stored value; text that is not valid UTF-8 is an error.
fn column_value(value: ValueRef<'_>) -> rusqlite::Result<ColumnValue> {
    Ok(match value {
        ValueRef::Null => ColumnValue::Null,
        ValueRef::Integer(n) => ColumnValue::Integer(n),
        ValueRef::Real(f) => ColumnValue::Real(f),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| ColumnValue::Text(text.to_owned()))
            .map_err(rusqlite::Error::Utf8Error)?,
        ValueRef::Blob(bytes) => ColumnValue::Blob(bytes.to_vec()),
    })
}

/// Rewrites `$N` placeholders to `?N`, leaving quoted text alone.
fn numbered_placeholders(sql: &str) -> Cow<'_, str> {
    if !sql.contains('$') {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len());
    let mut quote: Option<char> = None;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '$' && chars.peek().is_some_and(char::is_ascii_digit) => {
                out.push('?');
                continue;
            }
            None => {}
        }
        out.push(c);
    }
    Cow::Owned(out)
}
