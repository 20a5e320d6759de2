//! Rows returned by a statement.

use swapdb_codec::ColumnValue;

/// The outcome of one executed statement.
///
/// Row-returning statements fill `columns` and `rows`; other statements
/// report `rows_affected` and leave both empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<ColumnValue>>,
    rows_affected: u64,
}

impl ResultSet {
    /// Creates a result set holding rows.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<ColumnValue>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: 0,
        }
    }

    /// Creates a result set for a statement that returned no rows.
    #[must_use]
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    /// Column names, in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<ColumnValue>] {
        &self.rows
    }

    /// Number of rows changed by a non-query statement.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Number of rows returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, e.g. the result of `SELECT count(*)`.
    #[must_use]
    pub fn scalar(&self) -> Option<&ColumnValue> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Position of the named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of the named column in row `row`.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&ColumnValue> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(index))
    }

    /// Iterates over rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<ColumnValue>> {
        self.rows.iter()
    }

    /// Consumes the result set, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<ColumnValue>> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Vec<ColumnValue>;
    type IntoIter = std::slice::Iter<'a, Vec<ColumnValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Vec<ColumnValue>;
    type IntoIter = std::vec::IntoIter<Vec<ColumnValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
