use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::runtime::Value;

/// One observation: column name -> value
pub type Row = HashMap<String, Value>;

/// Named, ordered table of rows
///
/// `columns` records first-seen order and is the order used for listings
/// and storage, whatever order the row maps iterate in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    /// Dataset name (without libref)
    pub name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Creates an empty dataset
    pub fn new(name: impl Into<String>) -> Self {
        Dataset {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Creates an empty dataset with a fixed column order
    pub fn with_columns(name: impl Into<String>, columns: Vec<String>) -> Self {
        let mut ds = Dataset::new(name);
        for column in columns {
            ds.add_column(&column);
        }
        ds
    }

    /// Registers a column if no column of that name (any case) exists.
    /// Returns the canonical spelling.
    pub fn add_column(&mut self, name: &str) -> String {
        match self.column_name(name) {
            Some(existing) => existing.to_string(),
            None => {
                self.columns.push(name.to_string());
                name.to_string()
            }
        }
    }

    /// Appends a row given as ordered `(column, value)` pairs
    pub fn push_row(&mut self, values: Vec<(String, Value)>) {
        let mut row = Row::with_capacity(values.len());
        for (column, value) in values {
            let column = self.add_column(&column);
            row.insert(column, value);
        }
        self.rows.push(row);
    }

    /// Appends a row map. Columns not seen before are registered in
    /// name order, since a map carries no order of its own.
    pub fn add_row(&mut self, row: Row) {
        let mut entries: Vec<(String, Value)> = row.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.push_row(entries);
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Replaces the rows, keeping the column order
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Takes ownership of the rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Canonical spelling of a column, case-insensitively
    pub fn column_name(&self, name: &str) -> Option<&str> {
        self.column_index(name).map(|i| self.columns[i].as_str())
    }

    /// Cell value, or `None` if the row or column does not exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let column = self.column_name(column)?;
        self.rows.get(row)?.get(column)
    }

    /// Cell value with missing for absent cells
    pub fn value(&self, row: usize, column: &str) -> Value {
        self.get(row, column).cloned().unwrap_or_else(Value::missing)
    }

    /// Row values in column order (missing for absent cells)
    pub fn ordered_row(&self, row: usize) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| {
                self.rows
                    .get(row)
                    .and_then(|r| r.get(c))
                    .cloned()
                    .unwrap_or_else(Value::missing)
            })
            .collect()
    }
}

/// Case-insensitive lookup inside a bare row map
pub fn row_value<'a>(row: &'a Row, name: &str) -> Option<&'a Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}
