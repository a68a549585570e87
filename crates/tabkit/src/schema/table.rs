//! Table-level schema definition.

use serde::{Deserialize, Serialize};

use super::column::ColumnSchema;

/// Schema for an entire table, as produced by schema inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Name of the table.
    pub name: String,
    /// Number of rows that were scanned.
    pub rows: usize,
    /// Schemas for each column, in first-seen order.
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a new empty table schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: 0,
            columns: Vec::new(),
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns whose inferred type is numeric.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.is_numeric())
    }
}
