//! Column-oriented SELECT results.

use crate::error::{Error, Result};

use super::value::Value;

/// Rows of a SELECT, stored column by column.
///
/// Column names are lower-cased and trimmed and kept in server order. All
/// columns always hold the same number of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    names: Vec<String>,
    values: Vec<Vec<Value>>,
    /// Row count as the server-compatible estimate computed it.
    row_count: usize,
}

impl ResultSet {
    /// Create an empty result set with the given column keys.
    pub(crate) fn with_columns(names: Vec<String>, row_count: usize) -> Self {
        let values = names.iter().map(|_| Vec::with_capacity(row_count)).collect();
        Self {
            names,
            values,
            row_count,
        }
    }

    pub(crate) fn push(&mut self, column: usize, value: Value) {
        self.values[column].push(value);
    }

    /// Column names in server order.
    pub fn column_names(&self) -> Vec<&str> {
        self.names.iter().map(|s| s.as_str()).collect()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.names.len()
    }

    /// Row count derived from the summed declared precisions.
    ///
    /// This matches what other Peasys clients report. When integer columns
    /// declare a precision different from their fixed wire width it can
    /// differ from [`len`](Self::len).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of rows actually decoded.
    pub fn len(&self) -> usize {
        self.values.first().map_or(0, |c| c.len())
    }

    /// Check if no rows were decoded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All values of a column (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        let key = name.trim().to_lowercase();
        self.names
            .iter()
            .position(|n| *n == key)
            .map(|i| self.values[i].as_slice())
    }

    /// Like [`column`](Self::column), but a missing column is an error.
    pub fn try_column(&self, name: &str) -> Result<&[Value]> {
        self.column(name).ok_or_else(|| Error::ColumnNotFound {
            name: name.to_string(),
        })
    }

    /// One value by row index and column name.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|c| c.get(row))
    }

    /// One row as values in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.len() {
            return None;
        }
        Some(self.values.iter().map(|c| &c[index]).collect())
    }

    /// Iterate over `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.names
            .iter()
            .zip(self.values.iter())
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}
