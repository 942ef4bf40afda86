//! One-dimensional projection of the predictors, for inspecting imputed values.
//!
//! Rows are projected onto the first principal component of the
//! standardized predictor columns. Plotting the target against that
//! component, coloured by the missing indicator, shows whether imputed
//! values follow the spread of the observed ones.

use crate::error::{ImputationError, Result};
use crate::utils::{is_numeric_dtype, mean, missing_count, numeric_values, sample_std};
use polars::prelude::*;
use tracing::debug;

const MAX_ITERATIONS: usize = 500;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Name of the projection column in [`ProjectionTable::to_frame`].
pub const COMPONENT_COLUMN: &str = "component";

/// Project each row of `df` onto the first principal component.
///
/// Uses every numeric column not named in `exclude`. Columns are centered
/// and scaled to unit variance; constant columns contribute nothing. The
/// component's sign is fixed so its largest loading is positive.
///
/// # Errors
///
/// - [`ImputationError::InsufficientData`] if `df` has no rows
/// - [`ImputationError::ProjectionFailed`] if there are no numeric columns
///   to project, or all of them are constant
/// - [`ImputationError::IncompletePredictor`] if a projected column has
///   missing values
pub fn first_component(df: &DataFrame, exclude: &[&str]) -> Result<Vec<f64>> {
    if df.height() == 0 {
        return Err(ImputationError::InsufficientData {
            column: COMPONENT_COLUMN.to_string(),
            complete_rows: 0,
            required: 1,
        });
    }

    let mut names = Vec::new();
    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if exclude.contains(&name) || !is_numeric_dtype(column.dtype()) {
            continue;
        }
        let series = column.as_materialized_series();
        let null_count = missing_count(series);
        if null_count > 0 {
            return Err(ImputationError::IncompletePredictor {
                column: name.to_string(),
                null_count,
            });
        }
        names.push(name.to_string());
        columns.push(standardize(numeric_values(series)?.into_iter().flatten().collect()));
    }

    if columns.is_empty() {
        return Err(ImputationError::ProjectionFailed(
            "no numeric columns left to project".to_string(),
        ));
    }

    let n = df.height();
    let d = columns.len();
    let covariance = covariance(&columns, n);
    let loadings = leading_eigenvector(&covariance, d).ok_or_else(|| {
        ImputationError::ProjectionFailed(format!(
            "columns [{}] have no variance",
            names.join(", ")
        ))
    })?;
    debug!("First component over {} columns", d);

    Ok((0..n)
        .map(|row| {
            columns
                .iter()
                .zip(&loadings)
                .map(|(column, loading)| column[row] * loading)
                .sum()
        })
        .collect())
}

fn standardize(values: Vec<f64>) -> Vec<f64> {
    let center = mean(&values).unwrap_or(0.0);
    let scale = sample_std(&values).filter(|s| *s > 1e-12).unwrap_or(1.0);
    values.into_iter().map(|v| (v - center) / scale).collect()
}

/// Sample covariance of centered columns, row-major d x d.
fn covariance(columns: &[Vec<f64>], n: usize) -> Vec<f64> {
    let d = columns.len();
    let denominator = (n as f64 - 1.0).max(1.0);
    let mut cov = vec![0.0; d * d];
    for i in 0..d {
        for j in i..d {
            let dot: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            cov[i * d + j] = dot / denominator;
            cov[j * d + i] = dot / denominator;
        }
    }
    cov
}

/// Power iteration for the dominant eigenvector of a symmetric PSD matrix.
///
/// Starts from the matrix column with the largest norm, so the start
/// vector always has a component along the dominant direction unless the
/// matrix is zero, in which case `None` is returned.
fn leading_eigenvector(matrix: &[f64], d: usize) -> Option<Vec<f64>> {
    let column_norm = |j: usize| (0..d).map(|i| matrix[i * d + j].powi(2)).sum::<f64>().sqrt();
    let start = (0..d).max_by(|&a, &b| column_norm(a).total_cmp(&column_norm(b)))?;
    if column_norm(start) <= 1e-12 {
        return None;
    }

    let mut v: Vec<f64> = (0..d).map(|i| matrix[i * d + start] / column_norm(start)).collect();
    for _ in 0..MAX_ITERATIONS {
        let w: Vec<f64> = (0..d)
            .map(|i| (0..d).map(|j| matrix[i * d + j] * v[j]).sum())
            .collect();
        let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm <= 1e-12 {
            return None;
        }
        let next: Vec<f64> = w.into_iter().map(|x| x / norm).collect();
        let diff = next
            .iter()
            .zip(&v)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        v = next;
        if diff < CONVERGENCE_TOLERANCE {
            break;
        }
    }

    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(1.0);
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
    Some(v)
}

/// Projection paired with the imputed target and its indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionTable {
    target_column: String,
    indicator_column: String,
    component: Vec<f64>,
    target: Vec<Option<f64>>,
    imputed: Vec<bool>,
}

impl ProjectionTable {
    /// Build from an imputed table, projecting every column other than
    /// `target` and `indicator`.
    pub fn build(df: &DataFrame, target: &str, indicator: &str) -> Result<Self> {
        let target_series = df
            .column(target)
            .map_err(|_| ImputationError::MissingColumn(target.to_string()))?
            .as_materialized_series();
        let indicator_series = df
            .column(indicator)
            .map_err(|_| ImputationError::MissingColumn(indicator.to_string()))?
            .as_materialized_series();

        let component = first_component(df, &[target, indicator])?;
        let target_values = numeric_values(target_series)?;
        let imputed = indicator_series
            .bool()?
            .into_iter()
            .map(|flag| flag.unwrap_or(false))
            .collect();

        Ok(Self {
            target_column: target.to_string(),
            indicator_column: indicator.to_string(),
            component,
            target: target_values,
            imputed,
        })
    }

    pub fn component(&self) -> &[f64] {
        &self.component
    }

    pub fn len(&self) -> usize {
        self.component.len()
    }

    pub fn is_empty(&self) -> bool {
        self.component.is_empty()
    }

    /// Three columns: `component`, the target and the indicator.
    pub fn to_frame(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Series::new(COMPONENT_COLUMN.into(), self.component.clone()).into_column(),
            Series::new(self.target_column.as_str().into(), self.target.clone()).into_column(),
            Series::new(self.indicator_column.as_str().into(), self.imputed.clone()).into_column(),
        ])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // first_component() tests
    // ========================================================================

    #[test]
    fn test_first_component_single_column_is_standardized() {
        let df = df!["x" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();
        let component = first_component(&df, &[]).unwrap();

        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        for (value, x) in component.iter().zip([1.0, 2.0, 3.0, 4.0, 5.0]) {
            assert!((value - (x - 3.0) / std).abs() < 1e-9);
        }
    }

    #[test]
    fn test_first_component_anticorrelated_columns() {
        // Leading direction is (1, -1) / sqrt(2)
        let df = df![
            "a" => [1.0, 2.0, 3.0, 4.0],
            "b" => [40.0, 30.0, 20.0, 10.0],
        ]
        .unwrap();
        let component = first_component(&df, &[]).unwrap();

        assert!(component.windows(2).all(|w| w[0] != w[1]));
        assert!(component.iter().sum::<f64>().abs() < 1e-9);
        let magnitudes: Vec<f64> = component.iter().map(|c| c.abs()).collect();
        assert!((magnitudes[0] - magnitudes[3]).abs() < 1e-9);
    }

    #[test]
    fn test_first_component_excludes_columns() {
        let df = df![
            "x" => [1.0, 2.0, 3.0],
            "y" => [Some(9.0), None, Some(1.0)],
            "label" => ["a", "b", "c"],
        ]
        .unwrap();
        let component = first_component(&df, &["y"]).unwrap();
        assert_eq!(component.len(), 3);
        assert!(component[0] < component[2]);
    }

    #[test]
    fn test_first_component_no_rows() {
        let df = df!["x" => Vec::<f64>::new()].unwrap();
        assert!(matches!(
            first_component(&df, &[]),
            Err(ImputationError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_first_component_no_columns() {
        let df = df!["y" => [1.0, 2.0]].unwrap();
        assert!(matches!(
            first_component(&df, &["y"]),
            Err(ImputationError::ProjectionFailed(_))
        ));
    }

    #[test]
    fn test_first_component_constant_columns() {
        let df = df!["pool" => [0.0, 0.0, 0.0]].unwrap();
        assert!(matches!(
            first_component(&df, &[]),
            Err(ImputationError::ProjectionFailed(_))
        ));
    }

    #[test]
    fn test_first_component_incomplete_column() {
        let df = df!["x" => [Some(1.0), None]].unwrap();
        assert!(matches!(
            first_component(&df, &[]),
            Err(ImputationError::IncompletePredictor { .. })
        ));
    }

    #[test]
    fn test_leading_eigenvector() {
        // [[2, 1], [1, 2]] has dominant eigenvector (1, 1) / sqrt(2)
        let v = leading_eigenvector(&[2.0, 1.0, 1.0, 2.0], 2).unwrap();
        let expected = std::f64::consts::FRAC_1_SQRT_2;
        assert!((v[0] - expected).abs() < 1e-9);
        assert!((v[1] - expected).abs() < 1e-9);
    }

    // ========================================================================
    // ProjectionTable tests
    // ========================================================================

    #[test]
    fn test_projection_table_frame() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "z" => [2.0, 1.0, 4.0, 3.0],
            "y" => [10.0, 19.5, 30.2, 41.0],
            "y_missing" => [false, true, false, false],
        ]
        .unwrap();

        let table = ProjectionTable::build(&df, "y", "y_missing").unwrap();
        assert_eq!(table.len(), 4);

        let frame = table.to_frame().unwrap();
        let names: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["component", "y", "y_missing"]);
        let flags: Vec<bool> = frame
            .column("y_missing")
            .unwrap()
            .as_materialized_series()
            .bool()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(flags, vec![false, true, false, false]);
    }

    #[test]
    fn test_projection_table_missing_indicator() {
        let df = df![
            "x" => [1.0, 2.0],
            "y" => [1.0, 2.0],
        ]
        .unwrap();
        assert!(matches!(
            ProjectionTable::build(&df, "y", "y_missing"),
            Err(ImputationError::MissingColumn(c)) if c == "y_missing"
        ));
    }
}
