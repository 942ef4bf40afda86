//! Shared utilities for column inspection and small statistics.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for exploration purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Signed or unsigned integers
    Integer,
    /// Floating point numbers
    Float,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types (dates, nested, all-null)
    Other,
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is a floating point type.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    is_integer_dtype(dtype) || is_float_dtype(dtype)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_integer_dtype(dtype) {
        DtypeCategory::Integer
    } else if is_float_dtype(dtype) {
        DtypeCategory::Float
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// Column Value Utilities
// =============================================================================

/// Extract a numeric Series as `f64` values. NaN counts as missing.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Number of missing entries in a Series (nulls, plus NaN for floats).
pub fn missing_count(series: &Series) -> usize {
    if is_float_dtype(series.dtype()) {
        numeric_values(series)
            .map(|values| values.iter().filter(|v| v.is_none()).count())
            .unwrap_or_else(|_| series.null_count())
    } else {
        series.null_count()
    }
}

/// Fraction of missing entries in a Series. Zero for an empty Series.
pub fn missing_fraction(series: &Series) -> f64 {
    if series.is_empty() {
        0.0
    } else {
        missing_count(series) as f64 / series.len() as f64
    }
}

/// Count occurrences of each non-null value, rendered as strings.
///
/// Sorted by descending count; ties are broken by the value so the
/// result is deterministic.
pub fn value_counts(series: &Series) -> Vec<(String, usize)> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Vec::new();
    }

    let Ok(str_series) = non_null.cast(&DataType::String) else {
        return Vec::new();
    };
    let Ok(str_chunked) = str_series.str() else {
        return Vec::new();
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for val in str_chunked.into_iter().flatten() {
        *counts.entry(val.to_string()).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

// =============================================================================
// Statistics
// =============================================================================

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (one degree of freedom removed).
///
/// Returns `None` for fewer than two values, where the estimate is undefined.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
        / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

// =============================================================================
// Tests
// =============================================================================
