//! Configuration types for imputation and exploration.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};

/// Row ordering of the imputed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RowOrder {
    /// Keep every row at its original position
    #[default]
    Preserve,
    /// Rows with a present target first, then the imputed rows.
    /// Each group keeps its original relative order.
    CompleteFirst,
}

/// What to do when the residual spread cannot be estimated
/// (fewer than two complete rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpreadPolicy {
    /// Fail the call with a `DegenerateSpread` error
    #[default]
    Fail,
    /// Use a spread of zero: imputed values are the bare predictions
    Zero,
}

/// Configuration for the stochastic regression imputer.
///
/// Use [`ImputerConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_imputation::config::{ImputerConfig, RowOrder};
///
/// let config = ImputerConfig::builder()
///     .row_order(RowOrder::CompleteFirst)
///     .indicator_suffix("_was_missing")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputerConfig {
    /// Suffix appended to the target name to form the indicator column.
    /// Default: "_missing"
    pub indicator_suffix: String,

    /// Row ordering of the output table.
    /// Default: Preserve
    pub row_order: RowOrder,

    /// Handling of an undefined residual spread.
    /// Default: Fail
    pub spread_policy: SpreadPolicy,

    /// Ridge penalty added to the standardized normal equations.
    /// 0.0 is plain ordinary least squares.
    /// Default: 0.0
    pub ridge_penalty: f64,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            indicator_suffix: "_missing".to_string(),
            row_order: RowOrder::default(),
            spread_policy: SpreadPolicy::default(),
            ridge_penalty: 0.0,
        }
    }
}

impl ImputerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ImputerConfigBuilder {
        ImputerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.indicator_suffix.is_empty() {
            return Err(ConfigValidationError::EmptyIndicatorSuffix);
        }

        if !self.ridge_penalty.is_finite() || self.ridge_penalty < 0.0 {
            return Err(ConfigValidationError::InvalidRidgePenalty(
                self.ridge_penalty,
            ));
        }

        Ok(())
    }

    /// Name of the indicator column for `target`.
    pub fn indicator_column(&self, target: &str) -> String {
        format!("{}{}", target, self.indicator_suffix)
    }
}

/// Builder for [`ImputerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ImputerConfigBuilder {
    indicator_suffix: Option<String>,
    row_order: Option<RowOrder>,
    spread_policy: Option<SpreadPolicy>,
    ridge_penalty: Option<f64>,
}

impl ImputerConfigBuilder {
    /// Set the suffix of the missingness indicator column.
    pub fn indicator_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.indicator_suffix = Some(suffix.into());
        self
    }

    /// Set the row ordering of the output table.
    pub fn row_order(mut self, order: RowOrder) -> Self {
        self.row_order = Some(order);
        self
    }

    /// Set the policy for an undefined residual spread.
    pub fn spread_policy(mut self, policy: SpreadPolicy) -> Self {
        self.spread_policy = Some(policy);
        self
    }

    /// Set the ridge penalty.
    ///
    /// Collinear predictors make the plain least-squares system singular.
    /// A small positive penalty makes it solvable; it has to be asked for
    /// explicitly.
    pub fn ridge_penalty(mut self, alpha: f64) -> Self {
        self.ridge_penalty = Some(alpha);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ImputerConfig` or an error if validation fails.
    pub fn build(self) -> Result<ImputerConfig, ConfigValidationError> {
        let config = ImputerConfig {
            indicator_suffix: self
                .indicator_suffix
                .unwrap_or_else(|| "_missing".to_string()),
            row_order: self.row_order.unwrap_or_default(),
            spread_policy: self.spread_policy.unwrap_or_default(),
            ridge_penalty: self.ridge_penalty.unwrap_or(0.0),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Thresholds used by the dataset exploration report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationConfig {
    /// Columns with fewer distinct values than this are considered categorical.
    /// Default: 50
    pub categorical_threshold: usize,

    /// Missing fractions below this are reported as low.
    /// Default: 0.1
    pub missing_low_threshold: f64,

    /// Missing fractions at or above this are reported as high.
    /// Default: 0.9
    pub missing_high_threshold: f64,

    /// A value covering more than this fraction of rows is dominant.
    /// Default: 0.9
    pub dominant_value_threshold: f64,

    /// Columns with at most this many distinct values get their value counts listed.
    /// Default: 10
    pub limited_variety_threshold: usize,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            categorical_threshold: 50,
            missing_low_threshold: 0.1,
            missing_high_threshold: 0.9,
            dominant_value_threshold: 0.9,
            limited_variety_threshold: 10,
        }
    }
}

impl ExplorationConfig {
    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("missing_low_threshold", self.missing_low_threshold),
            ("missing_high_threshold", self.missing_high_threshold),
            ("dominant_value_threshold", self.dominant_value_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if self.missing_low_threshold > self.missing_high_threshold {
            return Err(ConfigValidationError::InvertedMissingThresholds {
                low: self.missing_low_threshold,
                high: self.missing_high_threshold,
            });
        }

        for (field, value) in [
            ("categorical_threshold", self.categorical_threshold),
            ("limited_variety_threshold", self.limited_variety_threshold),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::InvalidCount {
                    field: field.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Indicator suffix must not be empty")]
    EmptyIndicatorSuffix,

    #[error("Invalid ridge penalty: {0} (must be finite and non-negative)")]
    InvalidRidgePenalty(f64),

    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Missing-data thresholds are inverted: low {low} > high {high}")]
    InvertedMissingThresholds { low: f64, high: f64 },

    #[error("Invalid count for '{field}': {value} (must be at least 1)")]
    InvalidCount { field: String, value: usize },
}
