//! Table definitions and their binding to a live engine.

use parking_lot::RwLock;
use swapdb_codec::Storage;
use swapdb_engine::{BackendKind, Engine, EngineResult};

/// Which connection a schema is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Engine kind.
    pub backend: BackendKind,
    /// The engine's description, e.g. `sqlite /data/app.db`.
    pub target: String,
    /// Connection counter of the owning database; grows on every rebind.
    pub generation: u64,
}

/// One table's structure, as bound by a
/// [`SubstitutableDatabase`](crate::SubstitutableDatabase).
///
/// A binding is local to the object it is recorded on: binding a schema
/// never binds the schemas it references.
pub trait Schema: Send + Sync {
    /// Table name.
    fn name(&self) -> &str;

    /// Idempotent creation statement in the given dialect.
    fn create_sql(&self, backend: BackendKind) -> String;

    /// Records the connection this schema is bound to.
    fn bind(&self, binding: &Binding);

    /// Forgets the current binding.
    fn unbind(&self);

    /// Returns the current binding.
    fn binding(&self) -> Option<Binding>;

    /// Creates the table unless it already exists.
    ///
    /// # Errors
    ///
    /// Returns the engine's error verbatim.
    fn create_if_missing(&self, engine: &mut dyn Engine) -> EngineResult<()> {
        engine.execute_batch(&self.create_sql(engine.kind()))
    }
}

/// Logical column types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    /// Auto-incrementing integer primary key.
    AutoId,
    /// 64-bit integer.
    Integer,
    /// Double precision float.
    Real,
    /// Text.
    Text,
    /// Raw bytes.
    Blob,
    /// Boolean, stored as 0/1 on SQLite.
    Boolean,
    /// Value written by [`BinaryCodec`](swapdb_codec::BinaryCodec).
    Binary,
    /// Value written by [`JsonCodec`](swapdb_codec::JsonCodec).
    Json,
    /// Value written by [`TupleJsonCodec`](swapdb_codec::TupleJsonCodec).
    TupleJson,
    /// Integer referencing the `id` column of the named table.
    ForeignKey(String),
}

impl ColumnKind {
    /// The column kind that holds a codec's storage class.
    #[must_use]
    pub fn for_storage(storage: Storage) -> Self {
        match storage {
            Storage::Blob => Self::Binary,
            Storage::Text => Self::Json,
        }
    }

    fn sql_type(&self, backend: BackendKind) -> String {
        match self {
            Self::AutoId => backend.auto_id_type().to_string(),
            Self::Integer => backend.integer_type().to_string(),
            Self::Real => backend.real_type().to_string(),
            Self::Text | Self::Json | Self::TupleJson => "TEXT".to_string(),
            Self::Blob | Self::Binary => backend.blob_type().to_string(),
            Self::Boolean => match backend {
                BackendKind::Sqlite => "INTEGER".to_string(),
                BackendKind::Postgres => "BOOLEAN".to_string(),
            },
            Self::ForeignKey(table) => format!(
                "{} REFERENCES {} (\"id\")",
                backend.integer_type(),
                quote(table)
            ),
        }
    }
}

/// One column of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    nullable: bool,
    unique: bool,
}

impl Column {
    /// Creates a nullable column.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: true,
            unique: false,
        }
    }

    /// Creates an auto-incrementing primary key column.
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::AutoId)
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column `UNIQUE`.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column kind.
    #[must_use]
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    fn definition(&self, backend: BackendKind) -> String {
        let mut def = format!("{} {}", quote(&self.name), self.kind.sql_type(backend));
        if !self.nullable && self.kind != ColumnKind::AutoId {
            def.push_str(" NOT NULL");
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        def
    }
}

/// A declarative table definition.
///
/// # Example
///
/// ```
/// use swapdb_core::{BackendKind, Column, ColumnKind, Schema, Table};
///
/// let widget = Table::new("widget")
///     .column(Column::id("id"))
///     .column(Column::new("name", ColumnKind::Text).not_null());
///
/// assert_eq!(
///     widget.create_sql(BackendKind::Sqlite),
///     r#"CREATE TABLE IF NOT EXISTS "widget" ("id" INTEGER PRIMARY KEY, "name" TEXT NOT NULL)"#
/// );
/// ```
#[derive(Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    binding: RwLock<Option<Binding>>,
}

impl Table {
    /// Creates a table with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            binding: RwLock::new(None),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Tables this table references through foreign keys.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match &c.kind {
            ColumnKind::ForeignKey(table) => Some(table.as_str()),
            _ => None,
        })
    }
}

impl Schema for Table {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_sql(&self, backend: BackendKind) -> String {
        let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (", quote(&self.name));
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&column.definition(backend));
        }
        sql.push(')');
        sql
    }

    fn bind(&self, binding: &Binding) {
        *self.binding.write() = Some(binding.clone());
    }

    fn unbind(&self) {
        *self.binding.write() = None;
    }

    fn binding(&self) -> Option<Binding> {
        self.binding.read().clone()
    }
}

/// Quotes an SQL identifier.
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
