//! Ordinary least squares regression.
//!
//! The model is fitted through the normal equations on centered, unit-norm
//! predictor columns, solved by Cholesky decomposition. Standardizing keeps
//! the Gram matrix diagonal at one, so the pivot tolerance used to detect a
//! singular system is scale-free.

use crate::error::{ImputationError, Result};

/// Smallest admissible Cholesky pivot of the standardized Gram matrix.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Relative tolerance under which a centered column counts as constant.
const VARIANCE_TOLERANCE: f64 = 1e-10;

/// Column-major design matrix (intercept column implicit).
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl Design {
    /// Create a design matrix from named columns of equal length.
    ///
    /// `n_rows` is explicit so a design without predictors still knows its height.
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>, n_rows: usize) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(ImputationError::Fit(format!(
                "{} predictor names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        if let Some((name, column)) = names
            .iter()
            .zip(&columns)
            .find(|(_, column)| column.len() != n_rows)
        {
            return Err(ImputationError::Fit(format!(
                "predictor '{}' has {} values, expected {}",
                name,
                column.len(),
                n_rows
            )));
        }
        Ok(Self {
            names,
            columns,
            n_rows,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }
}

/// A fitted linear model `y = intercept + sum(coefficient_j * x_j)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fit by least squares, optionally with a ridge penalty on the
    /// standardized coefficients.
    ///
    /// # Errors
    ///
    /// Returns [`ImputationError::Fit`] if:
    /// - there are no rows, or fewer rows than features plus one
    /// - the response length doesn't match the design
    /// - a predictor is constant
    /// - the normal equations are singular
    pub fn fit(design: &Design, y: &[f64], ridge_penalty: f64) -> Result<Self> {
        let n = design.n_rows();
        let p = design.n_features();

        if y.len() != n {
            return Err(ImputationError::Fit(format!(
                "response has {} values, design has {} rows",
                y.len(),
                n
            )));
        }
        if n == 0 {
            return Err(ImputationError::Fit(
                "cannot fit a regression on zero rows".to_string(),
            ));
        }
        if n < p + 1 {
            return Err(ImputationError::Fit(format!(
                "{} rows cannot determine {} coefficients plus an intercept",
                n, p
            )));
        }

        let y_mean = y.iter().sum::<f64>() / n as f64;

        // Center and scale every column to unit norm.
        let mut means = Vec::with_capacity(p);
        let mut norms = Vec::with_capacity(p);
        let mut standardized = Vec::with_capacity(p);
        for (name, column) in design.names().iter().zip(design.columns()) {
            let mean = column.iter().sum::<f64>() / n as f64;
            let centered: Vec<f64> = column.iter().map(|x| x - mean).collect();
            let norm = centered.iter().map(|x| x * x).sum::<f64>().sqrt();

            if norm <= VARIANCE_TOLERANCE * (1.0 + mean.abs()) * (n as f64).sqrt() {
                return Err(ImputationError::Fit(format!(
                    "predictor '{}' is constant over the fitted rows",
                    name
                )));
            }

            means.push(mean);
            norms.push(norm);
            standardized.push(centered.into_iter().map(|x| x / norm).collect::<Vec<f64>>());
        }

        // Gram matrix Z^T Z (+ alpha I) and right-hand side Z^T (y - mean)
        let mut gram = vec![0.0; p * p];
        let mut rhs = vec![0.0; p];
        for i in 0..p {
            for j in 0..=i {
                let dot: f64 = standardized[i]
                    .iter()
                    .zip(&standardized[j])
                    .map(|(a, b)| a * b)
                    .sum();
                gram[i * p + j] = dot;
                gram[j * p + i] = dot;
            }
            gram[i * p + i] += ridge_penalty;
            rhs[i] = standardized[i]
                .iter()
                .zip(y)
                .map(|(z, yi)| z * (yi - y_mean))
                .sum();
        }

        let beta = cholesky_solve(&gram, &rhs, p).ok_or_else(|| {
            ImputationError::Fit(format!(
                "normal equations are singular; predictors [{}] are collinear",
                design.names().join(", ")
            ))
        })?;

        let coefficients: Vec<f64> = beta.iter().zip(&norms).map(|(b, norm)| b / norm).collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ImputationError::Fit(
                "regression produced non-finite coefficients".to_string(),
            ));
        }

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    /// Predict one value per design row.
    pub fn predict(&self, design: &Design) -> Result<Vec<f64>> {
        if design.n_features() != self.coefficients.len() {
            return Err(ImputationError::Fit(format!(
                "model has {} coefficients, design has {} features",
                self.coefficients.len(),
                design.n_features()
            )));
        }

        let mut predictions = vec![self.intercept; design.n_rows()];
        for (coefficient, column) in self.coefficients.iter().zip(design.columns()) {
            for (prediction, x) in predictions.iter_mut().zip(column) {
                *prediction += coefficient * x;
            }
        }
        Ok(predictions)
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Coefficient of determination. `None` when the response is constant.
pub fn r_squared(predictions: &[f64], actual: &[f64]) -> Option<f64> {
    if actual.is_empty() || predictions.len() != actual.len() {
        return None;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|y| (y - mean).powi(2)).sum();
    if total == 0.0 {
        return None;
    }
    let residual: f64 = predictions
        .iter()
        .zip(actual)
        .map(|(p, y)| (y - p).powi(2))
        .sum();
    Some(1.0 - residual / total)
}

/// Solve `A x = b` for a symmetric positive definite row-major `A` (n x n).
///
/// Returns `None` when a pivot falls below [`PIVOT_TOLERANCE`].
fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Option<Vec<f64>> {
    // A = L * L^T
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let diag = a[i * n + i] - sum;
                if !(diag > PIVOT_TOLERANCE) {
                    return None;
                }
                l[i * n + i] = diag.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i * n + j] * y[j]).sum();
        y[i] = (b[i] - sum) / l[i * n + i];
    }

    // Backward substitution: L^T * x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[j * n + i] * x[j]).sum();
        x[i] = (y[i] - sum) / l[i * n + i];
    }

    Some(x)
}
