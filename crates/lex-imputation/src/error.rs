//! Custom error types for imputation and dataset exploration.
//!
//! Every failure of an imputation call is fatal to that call: the imputer
//! never returns a partially imputed table. Errors are serializable so the
//! CLI can emit them in `--json` mode.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the imputation library.
#[derive(Error, Debug)]
pub enum ImputationError {
    /// Requested column was not found in the table.
    #[error("Column '{0}' not found in dataset")]
    MissingColumn(String),

    /// Too few complete rows to determine the regression.
    #[error(
        "Not enough complete rows to fit '{column}': {complete_rows} available, {required} required"
    )]
    InsufficientData {
        column: String,
        complete_rows: usize,
        required: usize,
    },

    /// Residual spread is undefined (fewer than two complete rows).
    #[error(
        "Residual spread for '{column}' is undefined with {complete_rows} complete row(s)"
    )]
    DegenerateSpread { column: String, complete_rows: usize },

    /// The least-squares solve failed.
    #[error("Failed to fit regression model: {0}")]
    Fit(String),

    /// A column that must be numeric is not.
    #[error("Column '{column}' has non-numeric type {dtype}")]
    NonNumericColumn { column: String, dtype: String },

    /// An integer target holds a value that `f64` cannot represent exactly.
    #[error("Target column '{column}' holds {value}, beyond exact f64 range")]
    InexactTarget { column: String, value: String },

    /// A predictor column contains missing values.
    #[error("Predictor column '{column}' has {null_count} missing value(s)")]
    IncompletePredictor { column: String, null_count: usize },

    /// Projection of the predictors could not be computed.
    #[error("Failed to project dataset: {0}")]
    ProjectionFailed(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ImputationError>,
    },
}

impl ImputationError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ImputationError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used in JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumn(_) => "MISSING_COLUMN",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::DegenerateSpread { .. } => "DEGENERATE_SPREAD",
            Self::Fit(_) => "FIT_ERROR",
            Self::NonNumericColumn { .. } => "NON_NUMERIC_COLUMN",
            Self::IncompletePredictor { .. } => "INCOMPLETE_PREDICTOR",
            Self::InexactTarget { .. } => "INEXACT_TARGET",
            Self::ProjectionFailed(_) => "PROJECTION_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error stems from the shape or content of the input data.
    ///
    /// These are not transient: retrying the same call fails the same way.
    /// The caller has to filter or fix the table upstream.
    pub fn is_data_quality(&self) -> bool {
        match self {
            Self::MissingColumn(_)
            | Self::InsufficientData { .. }
            | Self::DegenerateSpread { .. }
            | Self::Fit(_)
            | Self::NonNumericColumn { .. }
            | Self::IncompletePredictor { .. }
            | Self::InexactTarget { .. } => true,
            Self::WithContext { source, .. } => source.is_data_quality(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for ImputationError {
    fn from(err: ConfigValidationError) -> Self {
        ImputationError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ImputationError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ImputationError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for imputation operations.
pub type Result<T> = std::result::Result<T, ImputationError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ImputationError::Polars(e).with_context(context))
    }
}
