use crate::config::RowOrder;
use serde::{Deserialize, Serialize};

// =============================================================================
// Imputation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub feature: String,
    pub value: f64,
}

/// What a single imputation call did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationSummary {
    pub target_column: String,
    pub indicator_column: String,
    pub rows: usize,
    pub complete_rows: usize,
    pub imputed_rows: usize,
    pub predictors: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<Coefficient>,
    /// Sample standard deviation of the in-sample residuals; the noise scale.
    pub residual_std: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    pub row_order: RowOrder,
}

impl ImputationSummary {
    pub fn imputed_percentage(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            (self.imputed_rows as f64 / self.rows as f64) * 100.0
        }
    }
}

/// Report emitted by the `impute` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationReport {
    pub generated_at: String,
    pub input_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    pub original_shape: (usize, usize),
    pub prepared_shape: (usize, usize),
    pub preparation_steps: Vec<String>,
    pub summary: ImputationSummary,
}

// =============================================================================
// Exploration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCardinality {
    pub column: String,
    pub distinct_values: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalAnalysis {
    /// Columns with fewer distinct values than the categorical threshold.
    pub categorical_features: Vec<ColumnCardinality>,
    /// String columns with at least the threshold of distinct values.
    pub high_cardinality_string_features: Vec<String>,
    /// Integer columns that look categorical.
    pub categorical_integer_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRate {
    pub column: String,
    pub fraction: f64,
}

/// Columns with missing data, bucketed by missing fraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingDataReport {
    pub high: Vec<MissingRate>,
    pub medium: Vec<MissingRate>,
    pub low: Vec<MissingRate>,
}

impl MissingDataReport {
    pub fn total_columns(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantValue {
    pub column: String,
    pub value: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedValue {
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDistribution {
    pub column: String,
    pub counts: Vec<ValueCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationReport {
    pub generated_at: String,
    pub shape: (usize, usize),
    /// dtype name -> number of columns, in order of first appearance.
    pub dtype_counts: Vec<(String, usize)>,
    pub integer_features: Vec<String>,
    pub float_features: Vec<String>,
    pub string_features: Vec<String>,
    pub categorical: CategoricalAnalysis,
    pub missing: MissingDataReport,
    pub dominant_values: Vec<DominantValue>,
    pub empty_columns: Vec<String>,
    pub fixed_columns: Vec<FixedValue>,
    pub limited_variety: Vec<ValueDistribution>,
}
