//! Per-column normalization onto a comparable, dimensionless scale.

use super::config::NormalizationMethod;

/// Output of min-max normalization for a column with no spread
pub const MIN_MAX_NEUTRAL: f64 = 0.5;

/// Output of z-score normalization for a column with no spread
pub const Z_SCORE_NEUTRAL: f64 = 0.0;

/// Normalize a metric column, then apply polarity reversal when lower values
/// are better. Reversal runs after the base transform, so a constant column
/// stays at its neutral value either way.
pub fn normalize_column(values: &[f64], method: NormalizationMethod, reverse: bool) -> Vec<f64> {
    let normalized = match method {
        NormalizationMethod::MinMax => min_max(values),
        NormalizationMethod::ZScore => z_score(values),
    };
    if !reverse {
        return normalized;
    }
    match method {
        NormalizationMethod::MinMax => normalized.into_iter().map(|n| 1.0 - n).collect(),
        // + 0.0 folds -0.0 into 0.0
        NormalizationMethod::ZScore => normalized.into_iter().map(|n| -n + 0.0).collect(),
    }
}

/// Linear rescale to [0, 1]: the minimum maps to 0, the maximum to 1.
///
/// A column without a defined, non-zero range (constant, single value, or no
/// finite values at all) maps every entry to `MIN_MAX_NEUTRAL`.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() || max == min {
        return vec![MIN_MAX_NEUTRAL; values.len()];
    }
    // Halve before subtracting when the span overflows f64
    let scale = if (max - min).is_finite() { 1.0 } else { 0.5 };
    let range = max * scale - min * scale;
    values.iter().map(|v| (v * scale - min * scale) / range).collect()
}

/// Standardize to mean 0 and unit population standard deviation (divide by N).
///
/// A column with zero or undefined deviation maps every entry to
/// `Z_SCORE_NEUTRAL`.
pub fn z_score(values: &[f64]) -> Vec<f64> {
    let Some((mean, std)) = population_stats(values) else {
        return vec![Z_SCORE_NEUTRAL; values.len()];
    };
    if !std.is_finite() || std == 0.0 {
        return vec![Z_SCORE_NEUTRAL; values.len()];
    }
    values.iter().map(|v| (v - mean) / std).collect()
}

/// Mean and population standard deviation, `None` for an empty column.
///
/// A column of identical values reports a deviation of exactly 0; summing
/// them would leave rounding noise in the mean.
fn population_stats(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    if values.iter().all(|&v| v == first) {
        return Some((first, 0.0));
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}
