//! Test fixtures and database helpers.
//!
//! Provides temporary on-disk databases and the `widget` schema used
//! across the test suites.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use swapdb_core::{
    BackendConfig, Column, ColumnKind, ColumnValue, Config, Schema, SubstitutableDatabase, Table,
};
use tempfile::TempDir;

/// Name of the fixture table.
pub const WIDGET: &str = "widget";

/// A `widget (id, name)` table.
pub fn widget_table() -> Arc<Table> {
    Arc::new(
        Table::new(WIDGET)
            .column(Column::id("id"))
            .column(Column::new("name", ColumnKind::Text).not_null()),
    )
}

/// The `widget` table as a schema object.
pub fn widget_schema() -> Arc<dyn Schema> {
    widget_table()
}

/// A table holding one column per codec.
pub fn codec_table() -> Arc<Table> {
    Arc::new(
        Table::new("codec_values")
            .column(Column::id("id"))
            .column(Column::new("packed", ColumnKind::Binary))
            .column(Column::new("doc", ColumnKind::Json))
            .column(Column::new("pair", ColumnKind::TupleJson)),
    )
}

/// A SQLite test database in a temporary directory.
pub struct TestDatabase {
    /// The database instance.
    pub db: SubstitutableDatabase,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Opens a fresh SQLite database with the given schemas.
    ///
    /// The backend is always embedded, whatever the environment says.
    pub fn sqlite(schemas: Vec<Arc<dyn Schema>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.db");
        let db = SubstitutableDatabase::open_with_config(
            &path,
            schemas,
            BackendConfig::embedded(&path),
            Config::default(),
        )
        .expect("Failed to open SQLite test database");

        Self { db, temp_dir }
    }

    /// Returns the temporary directory holding the database file.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns a path for another database file in the same directory.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = SubstitutableDatabase;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl std::ops::DerefMut for TestDatabase {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.db
    }
}

/// Runs a test with a temporary SQLite database.
pub fn with_temp_db<F, R>(schemas: Vec<Arc<dyn Schema>>, f: F) -> R
where
    F: FnOnce(&mut SubstitutableDatabase) -> R,
{
    let mut test_db = TestDatabase::sqlite(schemas);
    f(&mut test_db.db)
}

/// Returns `SELECT count(*)` for a table.
pub fn count_rows(db: &mut SubstitutableDatabase, table: &str) -> i64 {
    db.execute(&format!("SELECT count(*) FROM {table}"), &[])
        .expect("count query failed")
        .scalar()
        .and_then(ColumnValue::as_integer)
        .expect("count(*) returns an integer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_database() {
        let mut test_db = TestDatabase::sqlite(vec![widget_schema()]);
        assert!(test_db.is_open());
        assert_eq!(count_rows(&mut test_db, WIDGET), 0);
        assert!(test_db.dir().join("test.db").exists());
    }

    #[test]
    fn test_with_temp_db() {
        let rows = with_temp_db(vec![widget_schema()], |db| {
            db.execute("INSERT INTO widget (name) VALUES ($1)", &["a".into()])
                .unwrap();
            count_rows(db, WIDGET)
        });
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_codec_table() {
        let table: Arc<dyn Schema> = codec_table();
        with_temp_db(vec![table], |db| {
            assert_eq!(count_rows(db, "codec_values"), 0);
        });
    }
}
