//! Column type and nullability inference.
//!
//! The schema is always derived from the rows themselves. Transforms never
//! patch a schema incrementally; they rebuild it with [`infer_schema`] so that
//! it reflects the actual row contents.

use indexmap::IndexSet;

use crate::dataset::{Row, Value};
use crate::schema::{ColumnSchema, ColumnType, TableSchema};

/// Infer a table schema from `rows`.
///
/// Columns are the union of keys across all rows, in first-seen order. A
/// column's type comes from the first row holding a non-null value for it
/// (or [`ColumnType::Null`] if none does). A column is nullable when any row
/// lacks the key or holds null for it.
pub fn infer_schema(name: impl Into<String>, rows: &[Row]) -> TableSchema {
    let mut keys: IndexSet<&str> = IndexSet::new();
    for row in rows {
        keys.extend(row.keys().map(String::as_str));
    }

    let columns = keys
        .iter()
        .map(|&column| infer_column(column, rows))
        .collect();

    TableSchema {
        name: name.into(),
        rows: rows.len(),
        columns,
    }
}

fn infer_column(column: &str, rows: &[Row]) -> ColumnSchema {
    let mut column_type = None;
    let mut nullable = false;

    for row in rows {
        match row.get(column) {
            None | Some(Value::Null) => nullable = true,
            Some(value) => {
                if column_type.is_none() {
                    column_type = Some(value.column_type());
                }
            }
        }
        if nullable && column_type.is_some() {
            break;
        }
    }

    ColumnSchema::new(column, column_type.unwrap_or(ColumnType::Null), nullable)
}
