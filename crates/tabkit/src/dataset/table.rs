//! The immutable [`Dataset`] value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inference::infer_schema;
use crate::schema::{ColumnSchema, TableSchema};

use super::value::{Row, Value, get_or_null};

/// Metadata describing a dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMetadata {
    /// Dataset name.
    pub name: String,
    /// Optional free-form description.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Number of rows at construction time.
    pub rows: usize,
    /// Inferred column schema.
    pub columns: Vec<ColumnSchema>,
    /// When this snapshot was built.
    pub created_at: DateTime<Utc>,
}

/// An immutable table of rows plus inferred metadata.
///
/// Every transform builds a brand-new `Dataset` (new row vector, freshly
/// inferred schema) and leaves its input untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset metadata.
    pub metadata: DatasetMetadata,
    /// Row data.
    pub rows: Vec<Row>,
}

/// Create a dataset from rows, inferring its schema.
pub fn create_dataset(rows: Vec<Row>, name: impl Into<String>) -> Dataset {
    Dataset::new(name, rows)
}

impl Dataset {
    /// Create a dataset from rows, inferring its schema.
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        let schema = infer_schema(name, &rows);
        Self {
            metadata: DatasetMetadata {
                name: schema.name,
                description: None,
                rows: schema.rows,
                columns: schema.columns,
                created_at: Utc::now(),
            },
            rows,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    /// Build a new snapshot from `rows` that keeps this dataset's name and description.
    pub(crate) fn derive(&self, rows: Vec<Row>) -> Self {
        self.derive_named(self.metadata.name.clone(), rows)
    }

    /// Build a new snapshot from `rows` under a different name.
    pub(crate) fn derive_named(&self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        let mut out = Self::new(name, rows);
        out.metadata.description = self.metadata.description.clone();
        out
    }

    /// Dataset name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the inferred schema.
    pub fn column_count(&self) -> usize {
        self.metadata.columns.len()
    }

    /// Column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.metadata.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column schema by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.metadata.columns.iter().find(|c| c.name == name)
    }

    /// Check whether the schema has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// All values of a column, with absent keys reported as null.
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |row| get_or_null(row, column))
    }

    /// The schema as a standalone [`TableSchema`].
    pub fn schema(&self) -> TableSchema {
        TableSchema {
            name: self.metadata.name.clone(),
            rows: self.metadata.rows,
            columns: self.metadata.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;
    use crate::schema::ColumnType;

    #[test]
    fn test_metadata_rows_matches_len() {
        let ds = create_dataset(vec![row! { "a" => 1 }, row! { "a" => 2 }], "nums");
        assert_eq!(ds.metadata.rows, 2);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.name(), "nums");
        assert!(ds.metadata.description.is_none());
    }

    #[test]
    fn test_column_lookup() {
        let ds = create_dataset(vec![row! { "a" => 1, "b" => "x" }], "t");
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(ds.column("b").unwrap().column_type, ColumnType::String);
        assert!(ds.has_column("a"));
        assert!(!ds.has_column("z"));
        assert_eq!(ds.column_count(), 2);
    }

    #[test]
    fn test_values_reports_missing_as_null() {
        let ds = create_dataset(vec![row! { "a" => 1 }, row! { "b" => 2 }], "t");
        let values: Vec<&Value> = ds.values("a").collect();
        assert_eq!(values, vec![&Value::Number(1.0), &Value::Null]);
    }

    #[test]
    fn test_derive_keeps_name_and_description() {
        let ds = create_dataset(vec![row! { "a" => 1 }], "src").with_description("raw feed");
        let derived = ds.derive(vec![]);
        assert_eq!(derived.name(), "src");
        assert_eq!(derived.metadata.description.as_deref(), Some("raw feed"));
        assert_eq!(derived.metadata.rows, 0);
        assert!(derived.metadata.columns.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let ds = create_dataset(vec![row! { "a" => 1 }], "t");
        let json = serde_json::to_value(&ds).unwrap();
        assert_eq!(json["metadata"]["name"], "t");
        assert_eq!(json["metadata"]["rows"], 1);
        assert_eq!(json["metadata"]["columns"][0]["type"], "number");
        assert!(json["metadata"]["createdAt"].is_string());
        assert_eq!(json["rows"][0]["a"], 1.0);
    }
}
