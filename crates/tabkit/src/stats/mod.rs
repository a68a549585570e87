//! Statistics engine: pure numeric functions plus dataset-level wrappers.

mod describe;
mod numeric;

pub use describe::{
    CorrelationEntry, DescriptiveStats, correlation_matrix, describe, describe_column,
    detect_outliers, get_numeric_column, missing_values, value_counts,
};
pub use numeric::{
    max, mean, median, min, pearson_correlation, quantile, stddev, sum, variance,
};
