//! Dataset exploration report.
//!
//! Summarizes column types, categorical candidates, missing data, dominant
//! values and low-variety columns, to decide which features can take part in
//! an imputation.

use crate::config::ExplorationConfig;
use crate::error::Result;
use crate::preparation::{columns_without_data, fixed_value_columns};
use crate::types::{
    CategoricalAnalysis, ColumnCardinality, DominantValue, ExplorationReport, MissingDataReport,
    MissingRate, ValueCount, ValueDistribution,
};
use crate::utils::{DtypeCategory, get_dtype_category, missing_fraction, value_counts};
use chrono::Local;
use polars::prelude::*;
use tracing::{debug, info};

/// Builds an [`ExplorationReport`] for a table.
#[derive(Debug, Clone, Default)]
pub struct Explorer {
    config: ExplorationConfig,
}

impl Explorer {
    pub fn new(config: ExplorationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Explore `df`.
    ///
    /// Fails only on an invalid configuration.
    pub fn explore(&self, df: &DataFrame) -> Result<ExplorationReport> {
        self.config.validate()?;
        info!("Exploring dataset: {} rows x {} columns", df.height(), df.width());

        let mut dtype_counts: Vec<(String, usize)> = Vec::new();
        let mut integer_features = Vec::new();
        let mut float_features = Vec::new();
        let mut string_features = Vec::new();
        let mut cardinalities = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().to_string();
            let dtype = column.dtype().to_string();
            match dtype_counts.iter_mut().find(|(d, _)| *d == dtype) {
                Some((_, count)) => *count += 1,
                None => dtype_counts.push((dtype, 1)),
            }

            match get_dtype_category(column.dtype()) {
                DtypeCategory::Integer => integer_features.push(name.clone()),
                DtypeCategory::Float => float_features.push(name.clone()),
                DtypeCategory::String => string_features.push(name.clone()),
                DtypeCategory::Boolean | DtypeCategory::Other => {}
            }

            let counts = value_counts(column.as_materialized_series());
            cardinalities.push((name, counts));
        }

        let categorical = self.analyse_categorical(&cardinalities, &integer_features, &string_features);
        let missing = self.analyse_missing(df);
        let dominant_values = self.analyse_dominant_values(df.height(), &cardinalities);

        let empty_columns = columns_without_data(df);
        let fixed_columns = fixed_value_columns(df);
        let limited_variety = cardinalities
            .iter()
            .filter(|(_, counts)| {
                counts.len() > 1 && counts.len() <= self.config.limited_variety_threshold
            })
            .map(|(name, counts)| ValueDistribution {
                column: name.clone(),
                counts: counts
                    .iter()
                    .map(|(value, count)| ValueCount {
                        value: value.clone(),
                        count: *count,
                    })
                    .collect(),
            })
            .collect();

        debug!(
            "{} categorical, {} with missing data, {} dominant, {} empty, {} fixed",
            categorical.categorical_features.len(),
            missing.total_columns(),
            dominant_values.len(),
            empty_columns.len(),
            fixed_columns.len()
        );

        Ok(ExplorationReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            shape: (df.height(), df.width()),
            dtype_counts,
            integer_features,
            float_features,
            string_features,
            categorical,
            missing,
            dominant_values,
            empty_columns,
            fixed_columns,
            limited_variety,
        })
    }

    fn analyse_categorical(
        &self,
        cardinalities: &[(String, Vec<(String, usize)>)],
        integer_features: &[String],
        string_features: &[String],
    ) -> CategoricalAnalysis {
        let categorical_features: Vec<ColumnCardinality> = cardinalities
            .iter()
            .filter(|(_, counts)| counts.len() < self.config.categorical_threshold)
            .map(|(name, counts)| ColumnCardinality {
                column: name.clone(),
                distinct_values: counts.len(),
            })
            .collect();

        let is_categorical = |name: &str| categorical_features.iter().any(|c| c.column == name);

        CategoricalAnalysis {
            high_cardinality_string_features: string_features
                .iter()
                .filter(|name| !is_categorical(name.as_str()))
                .cloned()
                .collect(),
            categorical_integer_features: integer_features
                .iter()
                .filter(|name| is_categorical(name.as_str()))
                .cloned()
                .collect(),
            categorical_features,
        }
    }

    fn analyse_missing(&self, df: &DataFrame) -> MissingDataReport {
        let mut report = MissingDataReport::default();
        for column in df.get_columns() {
            let fraction = missing_fraction(column.as_materialized_series());
            if fraction <= 0.0 {
                continue;
            }

            let rate = MissingRate {
                column: column.name().to_string(),
                fraction,
            };
            if fraction >= self.config.missing_high_threshold {
                report.high.push(rate);
            } else if fraction >= self.config.missing_low_threshold {
                report.medium.push(rate);
            } else {
                report.low.push(rate);
            }
        }
        report
    }

    fn analyse_dominant_values(
        &self,
        height: usize,
        cardinalities: &[(String, Vec<(String, usize)>)],
    ) -> Vec<DominantValue> {
        if height == 0 {
            return Vec::new();
        }

        cardinalities
            .iter()
            .filter_map(|(name, counts)| {
                let (value, count) = counts.first()?;
                let fraction = *count as f64 / height as f64;
                (fraction > self.config.dominant_value_threshold).then(|| DominantValue {
                    column: name.clone(),
                    value: value.clone(),
                    fraction,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FixedValue;
    use pretty_assertions::assert_eq;

    fn sample_frame() -> DataFrame {
        let ids: Vec<i64> = (1..=20).collect();
        let areas: Vec<f64> = (0..20).map(|i| 8000.0 + 137.5 * i as f64).collect();
        let frontage: Vec<Option<f64>> = (0..20)
            .map(|i| if i % 4 == 0 { None } else { Some(60.0 + i as f64) })
            .collect();
        let garage: Vec<Option<f64>> = (0..20).map(|i| (i == 0).then_some(1.0)).collect();
        let quality: Vec<i64> = (0..20).map(|i| 5 + i % 3).collect();
        let street: Vec<&str> = (0..20).map(|i| if i == 7 { "Grvl" } else { "Pave" }).collect();
        let utilities = vec!["AllPub"; 20];
        let names: Vec<String> = (0..20).map(|i| format!("house-{}", i)).collect();
        let mut masonry: Vec<Option<f64>> = vec![Some(0.0); 20];
        masonry[3] = None;

        df![
            "Id" => ids,
            "LotArea" => areas,
            "LotFrontage" => frontage,
            "GarageCars" => garage,
            "OverallQual" => quality,
            "Street" => street,
            "Utilities" => utilities,
            "Name" => names,
            "MasVnrArea" => masonry,
            "Alley" => vec![Option::<&str>::None; 20],
        ]
        .unwrap()
    }

    fn explorer() -> Explorer {
        Explorer::new(ExplorationConfig {
            categorical_threshold: 10,
            ..ExplorationConfig::default()
        })
    }

    // ========================================================================
    // Types
    // ========================================================================

    #[test]
    fn test_feature_types() {
        let report = explorer().explore(&sample_frame()).unwrap();

        assert_eq!(report.shape, (20, 10));
        assert_eq!(report.integer_features, vec!["Id", "OverallQual"]);
        assert_eq!(
            report.float_features,
            vec!["LotArea", "LotFrontage", "GarageCars", "MasVnrArea"]
        );
        assert_eq!(report.string_features, vec!["Street", "Utilities", "Name", "Alley"]);
        assert_eq!(report.dtype_counts.iter().map(|(_, c)| c).sum::<usize>(), 10);
    }

    // ========================================================================
    // Categorical analysis
    // ========================================================================

    #[test]
    fn test_categorical_analysis() {
        let report = explorer().explore(&sample_frame()).unwrap();
        let categorical = report.categorical;

        let names: Vec<&str> = categorical
            .categorical_features
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["GarageCars", "OverallQual", "Street", "Utilities", "MasVnrArea", "Alley"]
        );
        assert_eq!(categorical.high_cardinality_string_features, vec!["Name"]);
        assert_eq!(categorical.categorical_integer_features, vec!["OverallQual"]);
    }

    // ========================================================================
    // Missing data
    // ========================================================================

    #[test]
    fn test_missing_data_buckets() {
        let report = explorer().explore(&sample_frame()).unwrap();
        let missing = report.missing;

        let names = |rates: &[MissingRate]| rates.iter().map(|r| r.column.clone()).collect::<Vec<_>>();
        assert_eq!(names(&missing.high), vec!["GarageCars", "Alley"]);
        assert_eq!(names(&missing.medium), vec!["LotFrontage"]);
        assert_eq!(names(&missing.low), vec!["MasVnrArea"]);
        assert!((missing.medium[0].fraction - 0.25).abs() < 1e-12);
        assert_eq!(missing.total_columns(), 4);
    }

    // ========================================================================
    // Dominant, empty, fixed and limited-variety columns
    // ========================================================================

    #[test]
    fn test_dominant_values() {
        let report = explorer().explore(&sample_frame()).unwrap();

        let dominant: Vec<(&str, &str)> = report
            .dominant_values
            .iter()
            .map(|d| (d.column.as_str(), d.value.as_str()))
            .collect();
        assert_eq!(
            dominant,
            vec![("Street", "Pave"), ("Utilities", "AllPub"), ("MasVnrArea", "0.0")]
        );
        assert!((report.dominant_values[0].fraction - 0.95).abs() < 1e-12);
    }

    #[test]
    fn test_empty_and_fixed_columns() {
        let report = explorer().explore(&sample_frame()).unwrap();

        assert_eq!(report.empty_columns, vec!["Alley"]);
        assert_eq!(
            report.fixed_columns,
            vec![
                FixedValue {
                    column: "GarageCars".to_string(),
                    value: "1.0".to_string(),
                },
                FixedValue {
                    column: "Utilities".to_string(),
                    value: "AllPub".to_string(),
                },
                FixedValue {
                    column: "MasVnrArea".to_string(),
                    value: "0.0".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_limited_variety() {
        let report = explorer().explore(&sample_frame()).unwrap();

        let columns: Vec<&str> = report.limited_variety.iter().map(|d| d.column.as_str()).collect();
        assert_eq!(columns, vec!["OverallQual", "Street"]);

        let street = &report.limited_variety[1];
        assert_eq!(
            street.counts,
            vec![
                ValueCount {
                    value: "Pave".to_string(),
                    count: 19,
                },
                ValueCount {
                    value: "Grvl".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let explorer = Explorer::new(ExplorationConfig {
            missing_low_threshold: 0.95,
            ..ExplorationConfig::default()
        });
        assert!(explorer.explore(&sample_frame()).is_err());
    }

    #[test]
    fn test_empty_frame() {
        let report = Explorer::default().explore(&DataFrame::empty()).unwrap();
        assert_eq!(report.shape, (0, 0));
        assert!(report.dominant_values.is_empty());
        assert_eq!(report.missing.total_columns(), 0);
    }
}
