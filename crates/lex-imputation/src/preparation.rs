//! Column filtering that brings a raw table into imputable shape.
//!
//! The imputer requires every predictor to be numeric and complete. These
//! helpers drop the columns that violate that, and [`prepare_for_imputation`]
//! chains them for one target column.

use crate::error::{ImputationError, Result};
use crate::types::FixedValue;
use crate::utils::{
    is_numeric_dtype, missing_count, missing_fraction, numeric_values, value_counts,
};
use polars::prelude::*;
use tracing::{debug, info};

/// Fraction of a centered column's norm that must survive projection onto
/// the earlier columns for it to count as linearly independent.
const DEPENDENCE_TOLERANCE: f64 = 1e-8;

/// A table ready for imputation and a log of what was removed.
#[derive(Debug, Clone)]
pub struct PreparedFrame {
    pub frame: DataFrame,
    pub steps: Vec<String>,
}

/// Names of integer and float columns, in table order.
pub fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect()
}

/// Keep only the numeric columns.
pub fn drop_non_numeric_features(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.select(numeric_columns(df))?)
}

/// Columns whose missing fraction exceeds `threshold`.
///
/// A threshold of `0.0` selects every column with at least one missing value.
pub fn features_with_missing_data(df: &DataFrame, threshold: f64) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| missing_fraction(c.as_materialized_series()) > threshold)
        .map(|c| c.name().to_string())
        .collect()
}

/// Drop every incomplete column except `target`.
pub fn drop_other_features_with_missing_data(df: &DataFrame, target: &str) -> Result<DataFrame> {
    ensure_column(df, target)?;
    let incomplete = features_with_missing_data(df, 0.0);
    retain(df, |name| name == target || !incomplete.iter().any(|c| c == name))
}

/// Columns holding no values at all.
pub fn columns_without_data(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|c| {
            let series = c.as_materialized_series();
            missing_count(series) == series.len()
        })
        .map(|c| c.name().to_string())
        .collect()
}

/// Drop columns that hold no values at all.
pub fn remove_features_without_data(df: &DataFrame) -> Result<DataFrame> {
    let empty = columns_without_data(df);
    retain(df, |name| !empty.iter().any(|c| c == name))
}

/// Columns with exactly one distinct non-null value, and that value.
pub fn fixed_value_columns(df: &DataFrame) -> Vec<FixedValue> {
    df.get_columns()
        .iter()
        .filter_map(|c| {
            let counts = value_counts(c.as_materialized_series());
            match counts.as_slice() {
                [(value, _)] => Some(FixedValue {
                    column: c.name().to_string(),
                    value: value.clone(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Drop columns that carry a single fixed value.
pub fn remove_features_with_fixed_data(df: &DataFrame) -> Result<DataFrame> {
    let fixed = fixed_value_columns(df);
    retain(df, |name| !fixed.iter().any(|f| f.column == name))
}

/// Complete numeric columns (other than `exclude`) that are an exact linear
/// combination of earlier columns plus a constant.
///
/// Columns are visited in table order and orthogonalized against the
/// columns kept so far (modified Gram-Schmidt on centered values). A column
/// whose remainder vanishes has an R² of one on its predecessors and is
/// reported; the earlier columns of the dependent set are kept. Constant,
/// incomplete and non-numeric columns are skipped.
pub fn collinear_columns(df: &DataFrame, exclude: &str) -> Result<Vec<String>> {
    let mut basis: Vec<Vec<f64>> = Vec::new();
    let mut collinear = Vec::new();

    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == exclude || !is_numeric_dtype(column.dtype()) {
            continue;
        }
        let series = column.as_materialized_series();
        if series.is_empty() || missing_count(series) > 0 {
            continue;
        }

        let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let mut remainder: Vec<f64> = values.iter().map(|x| x - mean).collect();
        let norm = dot(&remainder, &remainder).sqrt();
        if norm == 0.0 {
            continue;
        }

        for q in &basis {
            let projection = dot(&remainder, q);
            for (r, qi) in remainder.iter_mut().zip(q) {
                *r -= projection * qi;
            }
        }

        let remaining = dot(&remainder, &remainder).sqrt();
        if remaining <= DEPENDENCE_TOLERANCE * norm {
            collinear.push(name.to_string());
        } else {
            basis.push(remainder.into_iter().map(|r| r / remaining).collect());
        }
    }

    Ok(collinear)
}

/// Drop columns that are exact linear combinations of earlier ones.
pub fn remove_collinear_features(df: &DataFrame, exclude: &str) -> Result<DataFrame> {
    let collinear = collinear_columns(df, exclude)?;
    retain(df, |name| !collinear.iter().any(|c| c == name))
}

/// Reduce `df` to `target` plus the numeric, complete, non-constant,
/// linearly independent columns.
///
/// The target is never dropped here, even when it is empty or non-numeric;
/// the imputer reports those cases itself.
pub fn prepare_for_imputation(df: &DataFrame, target: &str) -> Result<PreparedFrame> {
    ensure_column(df, target)?;

    let mut steps = Vec::new();
    let mut frame = df.clone();

    let empty: Vec<String> = columns_without_data(&frame)
        .into_iter()
        .filter(|c| c != target)
        .collect();
    frame = drop_step(&frame, &empty, "without data", &mut steps)?;

    let non_numeric: Vec<String> = frame
        .get_columns()
        .iter()
        .filter(|c| c.name().as_str() != target && !is_numeric_dtype(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();
    frame = drop_step(&frame, &non_numeric, "non-numeric", &mut steps)?;

    let incomplete: Vec<String> = features_with_missing_data(&frame, 0.0)
        .into_iter()
        .filter(|c| c != target)
        .collect();
    frame = drop_step(&frame, &incomplete, "with missing data", &mut steps)?;

    let fixed: Vec<FixedValue> = fixed_value_columns(&frame)
        .into_iter()
        .filter(|f| f.column != target)
        .collect();
    for f in &fixed {
        debug!("'{}' is always {}", f.column, f.value);
    }
    let fixed_names: Vec<String> = fixed.into_iter().map(|f| f.column).collect();
    frame = drop_step(&frame, &fixed_names, "with a fixed value", &mut steps)?;

    let collinear = collinear_columns(&frame, target)?;
    frame = drop_step(&frame, &collinear, "collinear", &mut steps)?;

    info!(
        "Prepared '{}': {} rows x {} columns (from {})",
        target,
        frame.height(),
        frame.width(),
        df.width()
    );

    Ok(PreparedFrame { frame, steps })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn ensure_column(df: &DataFrame, name: &str) -> Result<()> {
    if df.column(name).is_err() {
        return Err(ImputationError::MissingColumn(name.to_string()));
    }
    Ok(())
}

fn retain(df: &DataFrame, keep: impl Fn(&str) -> bool) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| keep(name.as_str()))
        .map(|name| name.to_string())
        .collect();
    Ok(df.select(names)?)
}

fn drop_step(
    df: &DataFrame,
    columns: &[String],
    reason: &str,
    steps: &mut Vec<String>,
) -> Result<DataFrame> {
    if columns.is_empty() {
        return Ok(df.clone());
    }
    let step = format!(
        "Dropped {} column(s) {}: {}",
        columns.len(),
        reason,
        columns.join(", ")
    );
    info!("{}", step);
    steps.push(step);
    retain(df, |name| !columns.iter().any(|c| c == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn housing_frame() -> DataFrame {
        df![
            "Id" => [1i64, 2, 3, 4],
            "LotFrontage" => [Some(65.0), None, Some(68.0), Some(60.0)],
            "Street" => ["Pave", "Pave", "Grvl", "Pave"],
            "MasVnrArea" => [Some(196.0), Some(0.0), None, Some(0.0)],
            "Utilities" => ["AllPub", "AllPub", "AllPub", "AllPub"],
            "PoolArea" => [0i64, 0, 0, 0],
            "Alley" => [Option::<&str>::None, None, None, None],
            "SalePrice" => [208500i64, 181500, 223500, 140000],
        ]
        .unwrap()
    }

    // ========================================================================
    // Individual filters
    // ========================================================================

    #[test]
    fn test_numeric_columns() {
        assert_eq!(
            numeric_columns(&housing_frame()),
            vec!["Id", "LotFrontage", "MasVnrArea", "PoolArea", "SalePrice"]
        );
    }

    #[test]
    fn test_drop_non_numeric_features() {
        let df = drop_non_numeric_features(&housing_frame()).unwrap();
        assert_eq!(df.width(), 5);
        assert!(df.column("Street").is_err());
    }

    #[test]
    fn test_features_with_missing_data_threshold() {
        let df = housing_frame();
        assert_eq!(
            features_with_missing_data(&df, 0.0),
            vec!["LotFrontage", "MasVnrArea", "Alley"]
        );
        assert_eq!(features_with_missing_data(&df, 0.5), vec!["Alley"]);
    }

    #[test]
    fn test_drop_other_features_keeps_target() {
        let df = drop_other_features_with_missing_data(&housing_frame(), "LotFrontage").unwrap();
        assert!(df.column("LotFrontage").is_ok());
        assert!(df.column("MasVnrArea").is_err());
        assert!(df.column("Alley").is_err());
        assert_eq!(df.width(), 6);
    }

    #[test]
    fn test_drop_other_features_missing_target() {
        let result = drop_other_features_with_missing_data(&housing_frame(), "GarageYrBlt");
        assert!(matches!(result, Err(ImputationError::MissingColumn(_))));
    }

    #[test]
    fn test_remove_features_without_data() {
        let df = housing_frame();
        assert_eq!(columns_without_data(&df), vec!["Alley"]);
        assert_eq!(remove_features_without_data(&df).unwrap().width(), 7);
    }

    #[test]
    fn test_fixed_value_columns() {
        let fixed = fixed_value_columns(&housing_frame());
        assert_eq!(
            fixed,
            vec![
                FixedValue {
                    column: "Utilities".to_string(),
                    value: "AllPub".to_string(),
                },
                FixedValue {
                    column: "PoolArea".to_string(),
                    value: "0".to_string(),
                },
            ]
        );
        let df = remove_features_with_fixed_data(&housing_frame()).unwrap();
        assert!(df.column("Utilities").is_err());
        assert!(df.column("PoolArea").is_err());
    }

    fn basement_frame() -> DataFrame {
        let fin = [706i64, 978, 486, 216, 655, 732, 0, 859, 0, 851];
        let unf = [150i64, 284, 434, 540, 490, 64, 1686, 216, 952, 140];
        let total: Vec<i64> = fin.iter().zip(&unf).map(|(f, u)| f + u).collect();
        df![
            "BsmtFinSF1" => fin,
            "BsmtUnfSF" => unf,
            "TotalBsmtSF" => total,
            "LotArea" => [8450i64, 9600, 11250, 9550, 14260, 14115, 10084, 10382, 6120, 7420],
            "LotFrontage" => [Some(65.0), Some(80.0), Some(68.0), None, Some(84.0),
                              Some(85.0), Some(75.0), None, Some(51.0), Some(50.0)],
        ]
        .unwrap()
    }

    #[test]
    fn test_collinear_columns_identity() {
        let df = basement_frame();
        assert_eq!(
            collinear_columns(&df, "LotFrontage").unwrap(),
            vec!["TotalBsmtSF"]
        );
        let reduced = remove_collinear_features(&df, "LotFrontage").unwrap();
        assert_eq!(reduced.width(), 4);
        assert!(reduced.column("TotalBsmtSF").is_err());
    }

    #[test]
    fn test_collinear_columns_scaled_copy() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 5.0],
            "x_sq_ft" => [10.76, 21.52, 32.28, 53.8],
            "z" => [4.0, 1.0, 0.0, 2.0],
        ]
        .unwrap();
        assert_eq!(collinear_columns(&df, "z").unwrap(), vec!["x_sq_ft"]);
    }

    #[test]
    fn test_collinear_columns_independent() {
        assert!(collinear_columns(&housing_frame(), "LotFrontage").unwrap().is_empty());
    }

    #[test]
    fn test_collinear_columns_exempts_target() {
        let df = df![
            "a" => [1.0, 2.0, 4.0, 7.0],
            "b" => [3.0, 1.0, 2.0, 0.0],
            "y" => [4.0, 3.0, 6.0, 7.0],
        ]
        .unwrap();
        assert!(collinear_columns(&df, "y").unwrap().is_empty());
        assert_eq!(collinear_columns(&df, "b").unwrap(), Vec::<String>::new());
        assert_eq!(collinear_columns(&df, "none").unwrap(), vec!["y"]);
    }

    // ========================================================================
    // prepare_for_imputation() tests
    // ========================================================================

    #[test]
    fn test_prepare_for_imputation() {
        let prepared = prepare_for_imputation(&housing_frame(), "LotFrontage").unwrap();

        assert_eq!(
            prepared
                .frame
                .get_column_names()
                .into_iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>(),
            vec!["Id", "LotFrontage", "SalePrice"]
        );
        assert_eq!(prepared.steps.len(), 4);
        assert!(prepared.steps[0].contains("Alley"));
        assert!(prepared.steps[1].contains("Street"));
        assert!(prepared.steps[2].contains("MasVnrArea"));
        assert!(prepared.steps[3].contains("PoolArea"));
    }

    #[test]
    fn test_prepare_drops_collinear_predictor() {
        let prepared = prepare_for_imputation(&basement_frame(), "LotFrontage").unwrap();

        assert!(prepared.frame.column("TotalBsmtSF").is_err());
        assert_eq!(prepared.frame.width(), 4);
        assert_eq!(
            prepared.steps,
            vec!["Dropped 1 column(s) collinear: TotalBsmtSF".to_string()]
        );
    }

    #[test]
    fn test_prepare_keeps_empty_target() {
        let prepared = prepare_for_imputation(&housing_frame(), "Alley").unwrap();
        assert!(prepared.frame.column("Alley").is_ok());
    }

    #[test]
    fn test_prepare_missing_target() {
        let result = prepare_for_imputation(&housing_frame(), "GarageYrBlt");
        assert!(matches!(result, Err(ImputationError::MissingColumn(c)) if c == "GarageYrBlt"));
    }
}
