//! Dataset-level statistics.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, Value};

use super::numeric::{max, mean, median, min, pearson_correlation, quantile, stddev};

/// Descriptive statistics for a numeric column.
///
/// `count` and every statistic cover finite numeric values only. `null_count`
/// counts cells that are absent or null; non-numeric, non-null cells fall in
/// neither bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    pub null_count: usize,
}

impl DescriptiveStats {
    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let iqr = self.iqr();
        let lower = self.q1 - multiplier * iqr;
        let upper = self.q3 + multiplier * iqr;
        value < lower || value > upper
    }

    /// Calculate the z-score for a value.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// One cell of a correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationEntry {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
}

/// Finite numeric values of `column`, in row order.
pub fn get_numeric_column(dataset: &Dataset, column: &str) -> Vec<f64> {
    dataset.values(column).filter_map(Value::as_number).collect()
}

/// Describe one column.
///
/// Min and max are reported as 0 when the column has no numeric values.
pub fn describe_column(dataset: &Dataset, column: &str) -> DescriptiveStats {
    let values = get_numeric_column(dataset, column);
    let null_count = dataset.values(column).filter(|v| v.is_null()).count();

    DescriptiveStats {
        column: column.to_string(),
        count: values.len(),
        mean: mean(&values),
        std: stddev(&values),
        min: min(&values).unwrap_or(0.0),
        max: max(&values).unwrap_or(0.0),
        median: median(&values),
        q1: quantile(&values, 0.25),
        q3: quantile(&values, 0.75),
        null_count,
    }
}

/// Describe every column whose inferred type is numeric.
pub fn describe(dataset: &Dataset) -> Vec<DescriptiveStats> {
    dataset
        .schema()
        .numeric_columns()
        .map(|c| describe_column(dataset, &c.name))
        .collect()
}

/// Pairwise Pearson correlations between numeric columns.
///
/// Both orderings of each pair are emitted; the diagonal appears once per
/// column with coefficient 1. Each column's numeric values are collected
/// independently, so rows are not paired when columns have different null
/// patterns.
pub fn correlation_matrix(dataset: &Dataset) -> Vec<CorrelationEntry> {
    let schema = dataset.schema();
    let columns: Vec<(&str, Vec<f64>)> = schema
        .numeric_columns()
        .map(|c| (c.name.as_str(), get_numeric_column(dataset, &c.name)))
        .collect();

    let mut entries = Vec::with_capacity(columns.len() * columns.len());
    for (i, (name_a, values_a)) in columns.iter().enumerate() {
        for (j, (name_b, values_b)) in columns.iter().enumerate() {
            let coefficient = if i == j {
                1.0
            } else {
                pearson_correlation(values_a, values_b)
            };
            entries.push(CorrelationEntry {
                column_a: name_a.to_string(),
                column_b: name_b.to_string(),
                coefficient,
            });
        }
    }
    entries
}

/// Frequency of each raw value in `column`, in first-seen order.
///
/// Absent cells are counted under [`Value::Null`].
pub fn value_counts(dataset: &Dataset, column: &str) -> IndexMap<Value, usize> {
    let mut counts: IndexMap<Value, usize> = IndexMap::new();
    for value in dataset.values(column) {
        *counts.entry(value.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of absent or null cells for every schema column.
pub fn missing_values(dataset: &Dataset) -> IndexMap<String, usize> {
    dataset
        .metadata
        .columns
        .iter()
        .map(|c| {
            let missing = dataset.values(&c.name).filter(|v| v.is_null()).count();
            (c.name.clone(), missing)
        })
        .collect()
}

/// Row indices whose numeric value in `column` lies outside the IQR fences.
pub fn detect_outliers(dataset: &Dataset, column: &str, multiplier: f64) -> Vec<usize> {
    let stats = describe_column(dataset, column);
    if stats.count == 0 {
        return Vec::new();
    }
    dataset
        .values(column)
        .enumerate()
        .filter_map(|(idx, v)| v.as_number().map(|n| (idx, n)))
        .filter(|&(_, n)| stats.is_outlier_iqr(n, multiplier))
        .map(|(idx, _)| idx)
        .collect()
}
