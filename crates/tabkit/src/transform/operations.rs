//! Declarative transforms that can be serialized and run as pipeline steps.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Value};
use crate::error::{Result, TabkitError};
use crate::pipeline::{StepContext, StepFunction};

use super::reshape::Aggregation;

fn default_ascending() -> bool {
    true
}

/// A transform described as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformOperation {
    /// Sort rows by a column, nulls last.
    Sort {
        column: String,
        #[serde(default = "default_ascending")]
        ascending: bool,
    },

    /// Drop rows with nulls in `columns`, or in any column when empty.
    DropNulls {
        #[serde(default)]
        columns: Vec<String>,
    },

    /// Replace nulls in a column.
    FillNulls { column: String, value: Value },

    /// Min-max scale a numeric column.
    Normalize { column: String },

    /// Rename a column.
    RenameColumn { from: String, to: String },

    /// Keep only the listed columns.
    SelectColumns { columns: Vec<String> },

    /// Remove the listed columns.
    DropColumns { columns: Vec<String> },

    /// Group by a column and reduce each group.
    Aggregate {
        group_by: String,
        aggregations: IndexMap<String, Aggregation>,
    },

    /// Reshape long rows into wide ones.
    Pivot {
        index: String,
        pivot: String,
        value: String,
    },

    /// Random sample of up to `n` rows, reproducible when seeded.
    Sample {
        n: usize,
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl TransformOperation {
    /// Get a human-readable description of the operation.
    pub fn description(&self) -> String {
        match self {
            TransformOperation::Sort { column, ascending } => {
                let direction = if *ascending { "ascending" } else { "descending" };
                format!("Sort by '{}' ({})", column, direction)
            }
            TransformOperation::DropNulls { columns } if columns.is_empty() => {
                "Drop rows with nulls in any column".to_string()
            }
            TransformOperation::DropNulls { columns } => {
                format!("Drop rows with nulls in {:?}", columns)
            }
            TransformOperation::FillNulls { column, value } => {
                format!("Fill nulls in '{}' with {}", column, value)
            }
            TransformOperation::Normalize { column } => format!("Normalize '{}'", column),
            TransformOperation::RenameColumn { from, to } => {
                format!("Rename '{}' → '{}'", from, to)
            }
            TransformOperation::SelectColumns { columns } => {
                format!("Select columns {:?}", columns)
            }
            TransformOperation::DropColumns { columns } => format!("Drop columns {:?}", columns),
            TransformOperation::Aggregate {
                group_by,
                aggregations,
            } => {
                format!(
                    "Aggregate {} values grouped by '{}'",
                    aggregations.len(),
                    group_by
                )
            }
            TransformOperation::Pivot {
                index,
                pivot,
                value,
            } => format!("Pivot '{}' by '{}' on '{}'", value, pivot, index),
            TransformOperation::Sample { n, seed: Some(seed) } => {
                format!("Sample {} rows (seed {})", n, seed)
            }
            TransformOperation::Sample { n, seed: None } => format!("Sample {} rows", n),
        }
    }

    /// Columns the operation reads from.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            TransformOperation::Sort { column, .. }
            | TransformOperation::FillNulls { column, .. }
            | TransformOperation::Normalize { column } => vec![column.as_str()],
            TransformOperation::DropNulls { columns }
            | TransformOperation::SelectColumns { columns }
            | TransformOperation::DropColumns { columns } => {
                columns.iter().map(String::as_str).collect()
            }
            TransformOperation::RenameColumn { from, .. } => vec![from.as_str()],
            TransformOperation::Aggregate {
                group_by,
                aggregations,
            } => std::iter::once(group_by.as_str())
                .chain(aggregations.values().map(|a| a.column.as_str()))
                .collect(),
            TransformOperation::Pivot {
                index,
                pivot,
                value,
            } => vec![index.as_str(), pivot.as_str(), value.as_str()],
            TransformOperation::Sample { .. } => Vec::new(),
        }
    }

    /// Apply the operation, returning a new dataset.
    ///
    /// Fails with [`TabkitError::ColumnNotFound`] when a referenced column is
    /// not in the dataset's schema.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        if let Some(missing) = self
            .referenced_columns()
            .into_iter()
            .find(|c| !dataset.has_column(c))
        {
            return Err(TabkitError::ColumnNotFound(missing.to_string()));
        }

        let out = match self {
            TransformOperation::Sort { column, ascending } => dataset.sort_by(column, *ascending),
            TransformOperation::DropNulls { columns } if columns.is_empty() => {
                dataset.drop_nulls()
            }
            TransformOperation::DropNulls { columns } => dataset.drop_nulls_in(&as_strs(columns)),
            TransformOperation::FillNulls { column, value } => dataset.fill_nulls(column, value),
            TransformOperation::Normalize { column } => dataset.normalize(column),
            TransformOperation::RenameColumn { from, to } => dataset.rename_column(from, to),
            TransformOperation::SelectColumns { columns } => {
                dataset.select_columns(&as_strs(columns))
            }
            TransformOperation::DropColumns { columns } => dataset.drop_columns(&as_strs(columns)),
            TransformOperation::Aggregate {
                group_by,
                aggregations,
            } => dataset.aggregate(group_by, aggregations),
            TransformOperation::Pivot {
                index,
                pivot,
                value,
            } => dataset.pivot(index, pivot, value),
            TransformOperation::Sample { n, seed: Some(seed) } => {
                dataset.sample_rows_seeded(*n, *seed)
            }
            TransformOperation::Sample { n, seed: None } => dataset.sample_rows(*n),
        };
        Ok(out)
    }
}

fn as_strs(columns: &[String]) -> Vec<&str> {
    columns.iter().map(String::as_str).collect()
}

/// Pipeline step that applies a sequence of operations to a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub operations: Vec<TransformOperation>,
}

impl TransformStep {
    pub fn new(operations: Vec<TransformOperation>) -> Self {
        Self { operations }
    }

    /// Apply every operation in order, stopping at the first failure.
    pub fn apply(&self, dataset: &Dataset) -> Result<Dataset> {
        self.apply_with(dataset.clone(), |_, _| {})
    }

    /// Like [`TransformStep::apply`], calling `on_applied` after each operation.
    fn apply_with(
        &self,
        dataset: Dataset,
        mut on_applied: impl FnMut(&TransformOperation, &Dataset),
    ) -> Result<Dataset> {
        let mut current = dataset;
        for op in &self.operations {
            current = op.apply(&current)?;
            on_applied(op, &current);
        }
        Ok(current)
    }
}

impl From<TransformOperation> for TransformStep {
    fn from(op: TransformOperation) -> Self {
        Self::new(vec![op])
    }
}

#[async_trait]
impl StepFunction<Dataset> for TransformStep {
    async fn run(&self, input: Dataset, ctx: &StepContext) -> Result<Dataset> {
        self.apply_with(input, |op, current| {
            ctx.log(format!("{} ({} rows)", op.description(), current.row_count()));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::create_dataset;
    use crate::pipeline::LogBuffer;
    use crate::row;

    fn scores() -> Dataset {
        create_dataset(
            vec![
                row! { "team" => "a", "score" => 3 },
                row! { "team" => "b", "score" => Value::Null },
                row! { "team" => "a", "score" => 5 },
            ],
            "scores",
        )
    }

    #[test]
    fn test_apply_matches_direct_call() {
        let op = TransformOperation::Sort {
            column: "score".to_string(),
            ascending: false,
        };
        assert_eq!(op.apply(&scores()).unwrap().rows, scores().sort_by("score", false).rows);
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let op = TransformOperation::Normalize {
            column: "nope".to_string(),
        };
        let err = op.apply(&scores()).unwrap_err();
        assert!(matches!(err, TabkitError::ColumnNotFound(ref c) if c == "nope"));
    }

    #[test]
    fn test_drop_nulls_without_columns_uses_all() {
        let op = TransformOperation::DropNulls { columns: vec![] };
        assert_eq!(op.apply(&scores()).unwrap().row_count(), 2);
        assert_eq!(op.description(), "Drop rows with nulls in any column");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let op: TransformOperation =
            serde_json::from_str(r#"{"Sort": {"column": "score"}}"#).unwrap();
        assert_eq!(
            op,
            TransformOperation::Sort {
                column: "score".to_string(),
                ascending: true
            }
        );

        let agg: TransformOperation = serde_json::from_str(
            r#"{"Aggregate": {"group_by": "team", "aggregations": {"total": {"column": "score", "fn": "sum"}}}}"#,
        )
        .unwrap();
        let out = agg.apply(&scores()).unwrap();
        assert_eq!(out.rows[0].get("total"), Some(&Value::from(8)));
    }

    #[tokio::test]
    async fn test_step_logs_each_operation() {
        let step = TransformStep::new(vec![
            TransformOperation::DropNulls { columns: vec!["score".to_string()] },
            TransformOperation::Normalize {
                column: "score".to_string(),
            },
        ]);
        let logs = LogBuffer::new();
        let ctx = StepContext::new("p", "clean", 0, 1, logs.clone());
        let out = step.run(scores(), &ctx).await.unwrap();

        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows, step.apply(&scores()).unwrap().rows);
        let entries = logs.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Drop rows with nulls in [\"score\"] (2 rows)");
    }

    #[tokio::test]
    async fn test_step_stops_logging_at_failed_operation() {
        let step = TransformStep::new(vec![
            TransformOperation::DropNulls { columns: vec![] },
            TransformOperation::Normalize {
                column: "missing".to_string(),
            },
            TransformOperation::DropColumns {
                columns: vec!["team".to_string()],
            },
        ]);
        let logs = LogBuffer::new();
        let ctx = StepContext::new("p", "clean", 0, 1, logs.clone());

        let err = step.run(scores(), &ctx).await.unwrap_err();
        assert!(matches!(err, TabkitError::ColumnNotFound(ref c) if c == "missing"));
        assert!(matches!(
            step.apply(&scores()),
            Err(TabkitError::ColumnNotFound(_))
        ));
        assert_eq!(logs.entries().len(), 1);
    }
}
