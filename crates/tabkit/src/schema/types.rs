//! Core type definitions for schema representation.

use serde::{Deserialize, Serialize};

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Text values.
    String,
    /// Numeric values.
    Number,
    /// Boolean values (true/false).
    Boolean,
    /// Timestamps.
    Date,
    /// Nested objects.
    Object,
    /// Lists of values.
    Array,
    /// No non-null value was observed.
    Null,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Number)
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Null
    }
}
