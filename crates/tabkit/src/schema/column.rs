//! Column schema definition.

use serde::{Deserialize, Serialize};

use super::types::ColumnType;

/// Schema for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Type of the first non-null value seen for this column.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether any row is missing the column or holds null for it.
    pub nullable: bool,
}

impl ColumnSchema {
    /// Create a new column schema.
    pub fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }

    /// Check if this column holds numbers.
    pub fn is_numeric(&self) -> bool {
        self.column_type.is_numeric()
    }
}
