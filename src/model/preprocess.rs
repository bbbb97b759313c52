//! Preprocessing state fitted on the training split
//!
//! Numeric branch: median imputation then zero-mean unit-variance scaling.
//! Categorical branch: constant "missing" imputation then one-hot encoding
//! with unknown-category tolerance (an unseen category encodes as all zeros).

use serde::{Deserialize, Serialize};

use crate::cleaner::median;

/// Fill value for missing categorical cells
pub const MISSING_CATEGORY: &str = "missing";

/// Name of the one-hot indicator column for one category of one source column
pub fn indicator_name(column: &str, category: &str) -> String {
    format!("{}={}", column, category)
}

/// Per-column numeric imputation and scaling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPreprocessor {
    pub columns: Vec<String>,
    pub medians: Vec<f64>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl NumericPreprocessor {
    /// Fit medians, means and stds on column-major training data.
    ///
    /// An all-missing column fits median/mean 0; a constant column fits
    /// std 1 so scaling stays well-defined.
    pub fn fit(columns: Vec<String>, data: &[Vec<Option<f64>>]) -> Self {
        let mut medians = Vec::with_capacity(columns.len());
        let mut means = Vec::with_capacity(columns.len());
        let mut stds = Vec::with_capacity(columns.len());

        for values in data {
            let col_median = median(values.iter().filter_map(|v| *v)).unwrap_or(0.0);
            let imputed: Vec<f64> = values.iter().map(|v| v.unwrap_or(col_median)).collect();

            let n = imputed.len().max(1) as f64;
            let mean = imputed.iter().sum::<f64>() / n;
            let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt();

            medians.push(col_median);
            means.push(mean);
            stds.push(if std > 0.0 { std } else { 1.0 });
        }

        NumericPreprocessor {
            columns,
            medians,
            means,
            stds,
        }
    }

    /// Impute and scale one value of one column
    pub fn transform(&self, column_index: usize, value: Option<f64>) -> f64 {
        let value = match value {
            Some(v) if v.is_finite() => v,
            _ => self.medians[column_index],
        };
        (value - self.means[column_index]) / self.stds[column_index]
    }
}

/// Per-column category vocabulary fitted on the training split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    pub columns: Vec<String>,
    /// Sorted distinct categories per column, post missing-imputation
    pub categories: Vec<Vec<String>>,
}

impl CategoricalEncoder {
    /// Collect the sorted distinct category vocabulary per column
    pub fn fit(columns: Vec<String>, data: &[Vec<Option<String>>]) -> Self {
        let categories = data
            .iter()
            .map(|values| {
                let mut distinct: Vec<String> = values
                    .iter()
                    .map(|v| v.clone().unwrap_or_else(|| MISSING_CATEGORY.to_string()))
                    .collect();
                distinct.sort();
                distinct.dedup();
                distinct
            })
            .collect();

        CategoricalEncoder {
            columns,
            categories,
        }
    }

    /// Indicator column names, in column-then-category order
    pub fn output_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, cats)| {
                cats.iter().map(move |cat| indicator_name(column, cat))
            })
            .collect()
    }

    /// One-hot encode one cell of one column.
    ///
    /// A category never seen during fit produces an all-zero row.
    pub fn encode(&self, column_index: usize, value: Option<&str>) -> Vec<f64> {
        let value = value.unwrap_or(MISSING_CATEGORY);
        self.categories[column_index]
            .iter()
            .map(|cat| if cat == value { 1.0 } else { 0.0 })
            .collect()
    }
}
