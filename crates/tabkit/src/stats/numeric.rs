//! Pure numeric functions over slices of finite numbers.
//!
//! Callers are expected to pre-filter non-numeric values, typically with
//! [`super::get_numeric_column`].

use std::cmp::Ordering;

/// Sum of values (0 for an empty slice).
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean (0 for an empty slice).
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        sum(values) / values.len() as f64
    }
}

/// Smallest value, or `None` for an empty slice.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(|a, b| a.total_cmp(b))
}

/// Largest value, or `None` for an empty slice.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(|a, b| a.total_cmp(b))
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Median: the middle value, or the mean of the two middle values.
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let mid = n / 2;
    if n % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample variance (divides by `n - 1`); 0 when fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let squares: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    squares / (n - 1) as f64
}

/// Sample standard deviation.
pub fn stddev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Quantile `q` (in `[0, 1]`) by linear interpolation on the sorted values.
///
/// The position is `(n - 1) * q`, interpolated between its floor and ceiling
/// indices. Returns 0 for an empty slice; `q` outside `[0, 1]` is clamped.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lower = pos.floor() as usize;
    let upper = (pos.ceil() as usize).min(n - 1);
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// Pearson correlation coefficient.
///
/// Uses the first `min(a.len(), b.len())` values of each slice. Returns 0
/// when fewer than two pairs remain or either side has zero variance.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        covariance += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    covariance / (var_a * var_b).sqrt()
}
