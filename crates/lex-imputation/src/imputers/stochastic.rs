//! Stochastic regression imputation.
//!
//! Missing values of one target column are replaced by a least-squares
//! prediction from every other column plus Gaussian noise whose spread
//! matches the in-sample residuals. Imputed values therefore scatter around
//! the regression line the way observed values do, instead of collapsing
//! onto it.

use super::frame::ImputationFrame;
use crate::config::{ImputerConfig, RowOrder, SpreadPolicy};
use crate::error::{ImputationError, Result};
use crate::noise::GaussianNoise;
use crate::regression::{LinearModel, r_squared};
use crate::types::{Coefficient, ImputationSummary};
use crate::utils::sample_std;
use polars::prelude::*;
use rand::Rng;
use rand::distributions::Distribution;
use tracing::{debug, info, warn};

/// Output of [`StochasticRegressionImputer::impute_with_summary`].
#[derive(Debug, Clone)]
pub struct Imputation {
    pub frame: DataFrame,
    pub summary: ImputationSummary,
}

/// Imputes one numeric column from all the others.
#[derive(Debug, Clone, Default)]
pub struct StochasticRegressionImputer {
    config: ImputerConfig,
}

impl StochasticRegressionImputer {
    pub fn new(config: ImputerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Impute the missing values of `target`.
    ///
    /// Returns a new frame holding every column of `df` plus the boolean
    /// `<target><suffix>` indicator. `df` itself is left untouched. The
    /// target column comes back as `Float64`, so observed values are kept
    /// exactly only when `f64` represents them: integer targets beyond
    /// ±2^53 are rejected with [`ImputationError::InexactTarget`].
    ///
    /// # Errors
    ///
    /// - [`ImputationError::MissingColumn`] if `target` is not in `df`
    /// - [`ImputationError::InsufficientData`] if there are fewer complete
    ///   rows than predictors plus one (including none at all)
    /// - [`ImputationError::DegenerateSpread`] with fewer than two complete
    ///   rows under [`SpreadPolicy::Fail`]
    /// - [`ImputationError::Fit`] if the least-squares system is singular
    /// - [`ImputationError::NonNumericColumn`] /
    ///   [`ImputationError::IncompletePredictor`] if the predictors are not
    ///   numeric and complete
    pub fn impute<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        target: &str,
        rng: &mut R,
    ) -> Result<DataFrame> {
        Ok(self.impute_with_summary(df, target, rng)?.frame)
    }

    /// Same as [`impute`](Self::impute), also returning the fitted model and counts.
    pub fn impute_with_summary<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        target: &str,
        rng: &mut R,
    ) -> Result<Imputation> {
        if df.column(target).is_err() {
            return Err(ImputationError::MissingColumn(target.to_string()));
        }
        let indicator = self.config.indicator_column(target);
        if df.column(&indicator).is_ok() {
            return Err(ImputationError::InvalidConfig(format!(
                "indicator column '{}' already exists",
                indicator
            )));
        }

        let frame = ImputationFrame::from_frame(df, target)?;
        let (complete, incomplete) = frame.partition();

        info!(
            "Imputing '{}': {} complete rows, {} missing, {} predictors",
            target,
            complete.len(),
            incomplete.len(),
            frame.predictor_names().len()
        );

        let required = frame.predictor_names().len() + 1;
        if complete.len() < required {
            return Err(ImputationError::InsufficientData {
                column: target.to_string(),
                complete_rows: complete.len(),
                required,
            });
        }

        let observed = frame.observed(&complete);
        let design = frame.design(&complete)?;
        let model = LinearModel::fit(&design, &observed, self.config.ridge_penalty)?;

        let fitted = model.predict(&design)?;
        let residuals: Vec<f64> = fitted.iter().zip(&observed).map(|(p, y)| p - y).collect();
        let residual_std = self.residual_spread(frame.target_name(), &residuals)?;
        debug!(
            "'{}' model intercept {:.4}, residual std {:.4}",
            target,
            model.intercept(),
            residual_std
        );

        let noise = GaussianNoise::new(residual_std)?;
        let predictions = model.predict(&frame.design(&incomplete)?)?;

        let mut values: Vec<f64> = frame.target().iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        for (&row, prediction) in incomplete.iter().zip(predictions) {
            values[row] = prediction + noise.sample(rng);
        }
        let missing_mask: Vec<bool> = frame.target().iter().map(|v| v.is_none()).collect();

        let mut output = self.assemble(df, target, &indicator, values, missing_mask)?;
        if self.config.row_order == RowOrder::CompleteFirst {
            let order: Vec<IdxSize> = complete
                .iter()
                .chain(&incomplete)
                .map(|&row| row as IdxSize)
                .collect();
            output = output.take(&IdxCa::from_vec("row_order".into(), order))?;
        }

        let summary = ImputationSummary {
            target_column: target.to_string(),
            indicator_column: indicator,
            rows: frame.n_rows(),
            complete_rows: complete.len(),
            imputed_rows: incomplete.len(),
            predictors: frame.predictor_names().to_vec(),
            intercept: model.intercept(),
            coefficients: frame
                .predictor_names()
                .iter()
                .zip(model.coefficients())
                .map(|(feature, &value)| Coefficient {
                    feature: feature.clone(),
                    value,
                })
                .collect(),
            residual_std,
            r_squared: r_squared(&fitted, &observed),
            row_order: self.config.row_order,
        };

        Ok(Imputation {
            frame: output,
            summary,
        })
    }

    fn residual_spread(&self, target: &str, residuals: &[f64]) -> Result<f64> {
        match (sample_std(residuals), self.config.spread_policy) {
            (Some(std), _) => Ok(std),
            (None, SpreadPolicy::Fail) => Err(ImputationError::DegenerateSpread {
                column: target.to_string(),
                complete_rows: residuals.len(),
            }),
            (None, SpreadPolicy::Zero) => {
                warn!(
                    "Residual spread of '{}' is undefined with {} complete row(s); imputing without noise",
                    target,
                    residuals.len()
                );
                Ok(0.0)
            }
        }
    }

    /// Rebuild the table in original row order with the imputed target and indicator.
    fn assemble(
        &self,
        df: &DataFrame,
        target: &str,
        indicator: &str,
        values: Vec<f64>,
        missing_mask: Vec<bool>,
    ) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(df.width() + 1);
        let mut values = Some(values);
        for column in df.get_columns() {
            if column.name().as_str() == target
                && let Some(values) = values.take()
            {
                columns.push(Series::new(target.into(), values).into_column());
            } else {
                columns.push(column.clone());
            }
        }
        columns.push(Series::new(indicator.into(), missing_mask).into_column());

        Ok(DataFrame::new(columns)?)
    }
}

/// Impute `target` with the default configuration.
///
/// ```rust,ignore
/// use lex_imputation::stochastic_regression_impute;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let imputed = stochastic_regression_impute(&df, "LotFrontage", &mut rng)?;
/// ```
pub fn stochastic_regression_impute<R: Rng + ?Sized>(
    df: &DataFrame,
    target: &str,
    rng: &mut R,
) -> Result<DataFrame> {
    StochasticRegressionImputer::default().impute(df, target, rng)
}
