//! Typed, validated view of a table under imputation.

use crate::error::{ImputationError, Result};
use crate::regression::Design;
use crate::utils::{is_integer_dtype, is_numeric_dtype, missing_count, numeric_values};
use polars::prelude::*;

/// Integers up to this magnitude convert to `f64` and back unchanged.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Target values plus complete numeric predictors, extracted once from a frame.
#[derive(Debug, Clone)]
pub(crate) struct ImputationFrame {
    target_name: String,
    target: Vec<Option<f64>>,
    predictor_names: Vec<String>,
    predictors: Vec<Vec<f64>>,
}

impl ImputationFrame {
    /// Validate `df` and extract the target and predictor columns.
    ///
    /// The target must be numeric, or hold no values at all (a fully
    /// missing column often loads as a string column). Every other column
    /// must be numeric and complete.
    pub(crate) fn from_frame(df: &DataFrame, target: &str) -> Result<Self> {
        let target_column = df
            .column(target)
            .map_err(|_| ImputationError::MissingColumn(target.to_string()))?;
        let target_series = target_column.as_materialized_series();

        let target_values = if is_numeric_dtype(target_series.dtype()) {
            if is_integer_dtype(target_series.dtype()) {
                ensure_exact_in_f64(target_series, target)?;
            }
            numeric_values(target_series)?
        } else if target_series.null_count() == target_series.len() {
            vec![None; target_series.len()]
        } else {
            return Err(ImputationError::NonNumericColumn {
                column: target.to_string(),
                dtype: target_series.dtype().to_string(),
            });
        };

        let mut predictor_names = Vec::with_capacity(df.width().saturating_sub(1));
        let mut predictors = Vec::with_capacity(df.width().saturating_sub(1));
        for column in df.get_columns() {
            let name = column.name().as_str();
            if name == target {
                continue;
            }

            let series = column.as_materialized_series();
            if !is_numeric_dtype(series.dtype()) {
                return Err(ImputationError::NonNumericColumn {
                    column: name.to_string(),
                    dtype: series.dtype().to_string(),
                });
            }

            let null_count = missing_count(series);
            if null_count > 0 {
                return Err(ImputationError::IncompletePredictor {
                    column: name.to_string(),
                    null_count,
                });
            }

            predictor_names.push(name.to_string());
            predictors.push(numeric_values(series)?.into_iter().flatten().collect());
        }

        Ok(Self {
            target_name: target.to_string(),
            target: target_values,
            predictor_names,
            predictors,
        })
    }

    pub(crate) fn target_name(&self) -> &str {
        &self.target_name
    }

    pub(crate) fn target(&self) -> &[Option<f64>] {
        &self.target
    }

    pub(crate) fn predictor_names(&self) -> &[String] {
        &self.predictor_names
    }

    pub(crate) fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// Split row positions into (complete, incomplete), each in original order.
    pub(crate) fn partition(&self) -> (Vec<usize>, Vec<usize>) {
        (0..self.n_rows()).partition(|&row| self.target[row].is_some())
    }

    /// Design matrix restricted to `rows`.
    pub(crate) fn design(&self, rows: &[usize]) -> Result<Design> {
        let columns = self
            .predictors
            .iter()
            .map(|column| rows.iter().map(|&row| column[row]).collect())
            .collect();
        Design::new(self.predictor_names.clone(), columns, rows.len())
    }

    /// Present target values at `rows`, which must all be complete.
    pub(crate) fn observed(&self, rows: &[usize]) -> Vec<f64> {
        rows.iter().filter_map(|&row| self.target[row]).collect()
    }
}

fn ensure_exact_in_f64(series: &Series, target: &str) -> Result<()> {
    let beyond = if matches!(series.dtype(), DataType::UInt64) {
        series
            .u64()?
            .into_iter()
            .flatten()
            .find(|v| *v > MAX_EXACT_INTEGER)
            .map(|v| v.to_string())
    } else {
        let wide = series.cast(&DataType::Int64)?;
        wide.i64()?
            .into_iter()
            .flatten()
            .find(|v| v.unsigned_abs() > MAX_EXACT_INTEGER)
            .map(|v| v.to_string())
    };

    match beyond {
        Some(value) => Err(ImputationError::InexactTarget {
            column: target.to_string(),
            value,
        }),
        None => Ok(()),
    }
}
