//! Stochastic Regression Imputation Library
//!
//! Fills the missing values of one numeric column of a Polars table with
//! least-squares predictions from the other columns plus Gaussian noise
//! scaled to the residual spread, and flags the filled rows in a new
//! boolean indicator column.
//!
//! # Overview
//!
//! - **Imputation**: [`StochasticRegressionImputer`] and the
//!   [`stochastic_regression_impute`] shortcut
//! - **Preparation**: dropping non-numeric, incomplete, empty and fixed-value
//!   columns so the remaining predictors are usable ([`preparation`])
//! - **Exploration**: a report on column types, missing data and value
//!   variety ([`Explorer`])
//! - **Projection**: the first principal component of the predictors, to plot
//!   imputed values against observed ones ([`ProjectionTable`])
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_imputation::{ImputerConfig, LoadOptions, StochasticRegressionImputer, io, preparation};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let df = io::load_csv("data/housing.csv", &LoadOptions::default())?;
//! let prepared = preparation::prepare_for_imputation(&df, "LotFrontage")?;
//!
//! let imputer = StochasticRegressionImputer::new(ImputerConfig::default());
//! let mut rng = StdRng::seed_from_u64(0);
//! let imputation = imputer.impute_with_summary(&prepared.frame, "LotFrontage", &mut rng)?;
//!
//! println!("Imputed {} rows", imputation.summary.imputed_rows);
//! assert_eq!(imputation.frame.column("LotFrontage")?.null_count(), 0);
//! ```
//!
//! # Randomness
//!
//! The random source is always passed in by the caller. The same table,
//! target and identically seeded generator give bit-identical results.

pub mod config;
pub mod error;
pub mod exploration;
pub mod imputers;
pub mod io;
pub mod noise;
pub mod preparation;
pub mod projection;
pub mod regression;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, ExplorationConfig, ImputerConfig, ImputerConfigBuilder, RowOrder,
    SpreadPolicy,
};
pub use error::{ImputationError, Result as ImputationResult, ResultExt};
pub use exploration::Explorer;
pub use imputers::{Imputation, StochasticRegressionImputer, stochastic_regression_impute};
pub use io::LoadOptions;
pub use noise::GaussianNoise;
pub use preparation::PreparedFrame;
pub use projection::{ProjectionTable, first_component};
pub use regression::{Design, LinearModel};
pub use types::{ExplorationReport, ImputationReport, ImputationSummary};
