//! Imputation of missing values in a numeric column.
//!
//! Currently provides stochastic regression imputation: a least-squares fit
//! on the other columns plus residual-scaled Gaussian noise.

mod frame;
mod stochastic;

pub use stochastic::{Imputation, StochasticRegressionImputer, stochastic_regression_impute};
