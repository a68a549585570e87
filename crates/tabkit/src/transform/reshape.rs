//! Dataset-level transforms: aggregation, joins, pivots and scaling.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Row, Value, get_or_null};
use crate::stats;

/// Reduction applied to one column within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    /// Sum of numeric values (0 when there are none).
    Sum,
    /// Mean of numeric values (0 when there are none).
    Avg,
    /// Smallest numeric value (null when there are none).
    Min,
    /// Largest numeric value (null when there are none).
    Max,
    /// Number of rows in the group.
    Count,
}

/// One aggregation: which column to reduce and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Source column.
    pub column: String,
    /// Reduction to apply.
    #[serde(rename = "fn")]
    pub function: AggregateFn,
}

impl Aggregation {
    /// Create an aggregation.
    pub fn new(column: impl Into<String>, function: AggregateFn) -> Self {
        Self {
            column: column.into(),
            function,
        }
    }

    /// Sum of the finite numeric values in `column`.
    pub fn sum(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFn::Sum)
    }

    /// Mean of the finite numeric values in `column`.
    pub fn avg(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFn::Avg)
    }

    /// Smallest finite numeric value in `column`, or null.
    pub fn min(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFn::Min)
    }

    /// Largest finite numeric value in `column`, or null.
    pub fn max(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFn::Max)
    }

    /// Number of rows in the group, whatever `column` holds.
    pub fn count(column: impl Into<String>) -> Self {
        Self::new(column, AggregateFn::Count)
    }

    fn apply(&self, rows: &[Row]) -> Value {
        if self.function == AggregateFn::Count {
            return Value::from(rows.len());
        }
        let values: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(&self.column).and_then(Value::as_number))
            .collect();
        match self.function {
            AggregateFn::Sum => Value::Number(stats::sum(&values)),
            AggregateFn::Avg => Value::Number(stats::mean(&values)),
            AggregateFn::Min => stats::min(&values).into(),
            AggregateFn::Max => stats::max(&values).into(),
            AggregateFn::Count => Value::from(rows.len()),
        }
    }
}

impl Dataset {
    /// Group by `group_column` and reduce each group with `aggregations`.
    ///
    /// Output has one row per group, holding the group value under
    /// `group_column` plus one column per aggregation alias. Only finite
    /// numbers take part in the reductions; `count` counts rows.
    pub fn aggregate(
        &self,
        group_column: &str,
        aggregations: &IndexMap<String, Aggregation>,
    ) -> Dataset {
        let rows = self
            .group_by(group_column)
            .into_iter()
            .map(|(key, group)| {
                let mut out = Row::new();
                out.insert(group_column.to_string(), key);
                for (alias, aggregation) in aggregations {
                    out.insert(alias.clone(), aggregation.apply(&group));
                }
                out
            })
            .collect();
        self.derive(rows)
    }

    /// Inner join with `right`, matching `left_key` against `right_key`.
    ///
    /// See [`inner_join`].
    pub fn inner_join(&self, right: &Dataset, left_key: &str, right_key: &str) -> Dataset {
        inner_join(self, right, left_key, right_key)
    }

    /// Reshape long rows into one row per `index_column` value.
    ///
    /// Each distinct `pivot_column` value observed anywhere becomes a column
    /// (named by its display form) and every output row carries all of them,
    /// null where no source row matched. When an (index, pivot) pair repeats,
    /// the last row wins.
    pub fn pivot(&self, index_column: &str, pivot_column: &str, value_column: &str) -> Dataset {
        let pivot_keys: IndexSet<String> = self
            .values(pivot_column)
            .map(|v| v.to_string())
            .collect();

        let mut groups: IndexMap<Value, Row> = IndexMap::new();
        for row in &self.rows {
            let index = get_or_null(row, index_column).clone();
            let out = groups.entry(index.clone()).or_insert_with(|| {
                let mut fresh = Row::new();
                fresh.insert(index_column.to_string(), index);
                for key in &pivot_keys {
                    fresh.insert(key.clone(), Value::Null);
                }
                fresh
            });
            let key = get_or_null(row, pivot_column).to_string();
            out.insert(key, get_or_null(row, value_column).clone());
        }

        self.derive(groups.into_values().collect())
    }

    /// Min-max scale the numeric cells of `column` to `[0, 1]`.
    ///
    /// When every numeric value is equal, each becomes `0`. Non-numeric cells
    /// pass through unchanged.
    pub fn normalize(&self, column: &str) -> Dataset {
        let numeric: Vec<f64> = self.values(column).filter_map(Value::as_number).collect();
        let (Some(min), Some(max)) = (stats::min(&numeric), stats::max(&numeric)) else {
            return self.derive(self.rows.clone());
        };
        // Halved so that `max - min` cannot overflow to infinity.
        let half_range = max / 2.0 - min / 2.0;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut out = row.clone();
                if let Some(v) = row.get(column).and_then(Value::as_number) {
                    let scaled = if half_range == 0.0 {
                        0.0
                    } else {
                        (v / 2.0 - min / 2.0) / half_range
                    };
                    out.insert(column.to_string(), Value::Number(scaled));
                }
                out
            })
            .collect();
        self.derive(rows)
    }
}

/// Inner join `left` and `right` on equal raw key values.
///
/// Each left row is merged with every matching right row (right fields win on
/// name collisions); left rows with no match are dropped. A missing key only
/// matches another missing key. The result is named `<left>_joined`.
pub fn inner_join(left: &Dataset, right: &Dataset, left_key: &str, right_key: &str) -> Dataset {
    let mut index: HashMap<Option<&Value>, Vec<&Row>> = HashMap::new();
    for row in &right.rows {
        index.entry(row.get(right_key)).or_default().push(row);
    }

    let mut rows = Vec::new();
    for left_row in &left.rows {
        let Some(matches) = index.get(&left_row.get(left_key)) else {
            continue;
        };
        for right_row in matches {
            let mut merged = left_row.clone();
            merged.extend(right_row.iter().map(|(k, v)| (k.clone(), v.clone())));
            rows.push(merged);
        }
    }

    left.derive_named(format!("{}_joined", left.name()), rows)
}

/// Concatenate the rows of `datasets`.
///
/// The name comes from the first dataset, or `"concatenated"` when the slice
/// is empty.
pub fn concat(datasets: &[Dataset]) -> Dataset {
    let name = datasets
        .first()
        .map(|d| d.name().to_string())
        .unwrap_or_else(|| "concatenated".to_string());
    let rows = datasets.iter().flat_map(|d| d.rows.iter().cloned()).collect();
    Dataset::new(name, rows)
}
