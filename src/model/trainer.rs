//! Leakage filter and trainer
//!
//! Third pipeline stage: strips outcome-entangled columns, splits the feature
//! set (stratified 80/20, fixed seed), fits the preprocessing+classifier
//! bundle and evaluates it on the held-out split.

use std::collections::BTreeMap;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;
use crate::model::artifact::ModelArtifact;
use crate::model::logistic::{LogisticModel, TrainOptions};
use crate::model::metrics::{self, MetricsSummary};
use crate::model::preprocess::{CategoricalEncoder, NumericPreprocessor};
use crate::schema::RawTable;

/// Columns definitionally entangled with the outcome's aftermath; they never
/// reach the model regardless of what the feature file carries.
pub const LEAKAGE_COLUMNS: [&str; 3] = ["months_overdue", "overdue_flag", "serious_arrears"];

/// Numeric modeling features, used when present in the feature file
pub const NUMERIC_FEATURES: [&str; 7] = [
    "income",
    "age",
    "credit_score",
    "loan_value",
    "loan_to_income",
    "estimated_monthly_payment",
    "pct_income_commitment",
];

/// Categorical modeling features, used when present
pub const CATEGORICAL_FEATURES: [&str; 2] = ["age_bucket", "score_bucket"];

/// Recognized outcome column names, in priority order
pub const OUTCOME_NAMES: [&str; 2] = ["outcome", "target"];

/// Trainer output: the fitted artifact plus its held-out metrics
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub artifact: ModelArtifact,
    pub metrics: MetricsSummary,
}

/// Train on a loaded feature table.
///
/// Fails only when the outcome column is missing under both recognized names
/// or the table is empty; absent feature columns merely narrow the feature
/// set.
pub fn train_from_table(
    table: &RawTable,
    seed: u64,
    test_fraction: f64,
) -> Result<TrainReport, PipelineError> {
    if table.is_empty() {
        return Err(PipelineError::EmptyDataset(
            "feature table has no rows".to_string(),
        ));
    }

    let labels = outcome_labels(table)?;
    let positive_label = labels.iter().copied().filter(|l| *l != 0).max().unwrap_or(1);
    if !labels.iter().any(|l| *l == positive_label) {
        warn!("Training labels are single-class; the fitted model will be degenerate");
    }

    // Leakage filter: feature lists already exclude the leakage columns, but
    // assert the invariant explicitly against the constants.
    debug_assert!(NUMERIC_FEATURES.iter().all(|c| !LEAKAGE_COLUMNS.contains(c)));
    debug_assert!(CATEGORICAL_FEATURES.iter().all(|c| !LEAKAGE_COLUMNS.contains(c)));

    let numeric_columns: Vec<String> = NUMERIC_FEATURES
        .iter()
        .filter(|name| table.column_index(name).is_some())
        .map(|name| name.to_string())
        .collect();
    let categorical_columns: Vec<String> = CATEGORICAL_FEATURES
        .iter()
        .filter(|name| table.column_index(name).is_some())
        .map(|name| name.to_string())
        .collect();
    info!(
        "Modeling features: {} numeric, {} categorical (leakage columns dropped: {})",
        numeric_columns.len(),
        categorical_columns.len(),
        LEAKAGE_COLUMNS.join(", ")
    );

    // Column-major feature extraction
    let numeric_data: Vec<Vec<Option<f64>>> = numeric_columns
        .iter()
        .map(|name| table.numeric_column(name).unwrap_or_default())
        .collect();
    let categorical_data: Vec<Vec<Option<String>>> = categorical_columns
        .iter()
        .map(|name| table.string_column(name).unwrap_or_default())
        .collect();

    let (train_idx, test_idx) = stratified_split(&labels, test_fraction, seed);

    // Fit preprocessing on the training split only
    let numeric_train: Vec<Vec<Option<f64>>> = numeric_data
        .iter()
        .map(|col| train_idx.iter().map(|i| col[*i]).collect())
        .collect();
    let categorical_train: Vec<Vec<Option<String>>> = categorical_data
        .iter()
        .map(|col| train_idx.iter().map(|i| col[*i].clone()).collect())
        .collect();
    let numeric = NumericPreprocessor::fit(numeric_columns, &numeric_train);
    let categorical = CategoricalEncoder::fit(categorical_columns, &categorical_train);

    let design_row = |row: usize| -> Vec<f64> {
        let mut out = Vec::new();
        for (col_idx, col) in numeric_data.iter().enumerate() {
            out.push(numeric.transform(col_idx, col[row]));
        }
        for (col_idx, col) in categorical_data.iter().enumerate() {
            out.extend(categorical.encode(col_idx, col[row].as_deref()));
        }
        out
    };

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|i| design_row(*i)).collect();
    let y_train: Vec<i64> = train_idx.iter().map(|i| labels[*i]).collect();
    let classifier = LogisticModel::fit(&x_train, &y_train, positive_label, &TrainOptions::default());

    // Held-out evaluation
    let y_test: Vec<i64> = test_idx.iter().map(|i| labels[*i]).collect();
    let scores: Vec<f64> = test_idx
        .iter()
        .map(|i| classifier.predict_proba(&design_row(*i)))
        .collect();
    let predicted: Vec<i64> = test_idx
        .iter()
        .map(|i| classifier.predict(&design_row(*i)))
        .collect();

    let auc = metrics::roc_auc(&y_test, &scores, positive_label);
    let (precision, recall, f1) = metrics::precision_recall_f1(&y_test, &predicted, positive_label);
    let summary = MetricsSummary {
        auc,
        gini: metrics::gini(auc),
        ks: metrics::ks_statistic(&y_test, &scores, positive_label),
        lift10: metrics::lift_at_k(&y_test, &scores, positive_label, 0.1),
        precision,
        recall,
        f1,
        n_train: train_idx.len(),
        n_test: test_idx.len(),
    };

    let artifact = ModelArtifact::new(numeric, categorical, classifier);
    Ok(TrainReport {
        artifact,
        metrics: summary,
    })
}

/// Locate and parse the outcome column under its recognized names
fn outcome_labels(table: &RawTable) -> Result<Vec<i64>, PipelineError> {
    for name in OUTCOME_NAMES {
        if let Some(values) = table.numeric_column(name) {
            return Ok(values
                .into_iter()
                .map(|v| v.map(|f| f.round() as i64).unwrap_or(0))
                .collect());
        }
    }
    Err(PipelineError::MissingOutcome(OUTCOME_NAMES.join(", ")))
}

/// Deterministic stratified split: within each label group, shuffle with the
/// seeded generator and hold out `test_fraction` (rounded, never the whole
/// group) for testing.
pub fn stratified_split(labels: &[i64], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, label) in labels.iter().enumerate() {
        groups.entry(*label).or_default().push(idx);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut indices) in groups {
        indices.shuffle(&mut rng);
        let mut holdout = ((indices.len() as f64) * test_fraction).round() as usize;
        if holdout >= indices.len() && !indices.is_empty() {
            holdout = indices.len() - 1;
        }
        test.extend(indices.drain(..holdout));
        train.extend(indices);
    }
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// 40-row synthetic feature table with real signal: defaults cluster on
    /// low score and high commitment.
    fn synthetic_feature_table() -> RawTable {
        let mut csv = String::from(
            "income,age,credit_score,loan_value,months_overdue,loan_to_income,\
             estimated_monthly_payment,pct_income_commitment,overdue_flag,\
             serious_arrears,age_bucket,score_bucket,outcome\n",
        );
        for i in 0..30 {
            let income = 3000.0 + (i as f64) * 50.0;
            let loan = 10000.0 + (i as f64) * 100.0;
            csv.push_str(&format!(
                "{income},{age},{score},{loan},0,{lti},{emp},{pct},0,0,25-34,alto,0\n",
                income = income,
                age = 28 + (i % 10),
                score = 760 + i,
                loan = loan,
                lti = loan / (income * 12.0),
                emp = loan / 60.0,
                pct = (loan / 60.0) / income,
            ));
        }
        for i in 0..10 {
            let income = 900.0 + (i as f64) * 20.0;
            let loan = 30000.0 + (i as f64) * 500.0;
            csv.push_str(&format!(
                "{income},{age},{score},{loan},4,{lti},{emp},{pct},1,1,<=24,baixo,1\n",
                income = income,
                age = 19 + (i % 5),
                score = 420 + i * 10,
                loan = loan,
                lti = loan / (income * 12.0),
                emp = loan / 60.0,
                pct = (loan / 60.0) / income,
            ));
        }
        RawTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_model_cols_never_contain_leakage_columns() {
        let report = train_from_table(&synthetic_feature_table(), 42, 0.2).unwrap();
        for leak in LEAKAGE_COLUMNS {
            assert!(
                !report.artifact.model_cols.iter().any(|c| c == leak || c.starts_with(&format!("{}=", leak))),
                "leakage column {} reached the model",
                leak
            );
        }
    }

    #[test]
    fn test_split_counts_and_metrics_presence() {
        let report = train_from_table(&synthetic_feature_table(), 42, 0.2).unwrap();
        assert_eq!(report.metrics.n_train, 32);
        assert_eq!(report.metrics.n_test, 8);
        // Strong synthetic signal: the classifier should discriminate well
        assert!(report.metrics.auc.unwrap() > 0.9);
        assert!(report.metrics.ks.unwrap() > 0.5);
    }

    #[test]
    fn test_training_is_reproducible_for_fixed_seed() {
        let table = synthetic_feature_table();
        let a = train_from_table(&table, 42, 0.2).unwrap();
        let b = train_from_table(&table, 42, 0.2).unwrap();
        assert_eq!(a.artifact.classifier, b.artifact.classifier);
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_missing_outcome_column_is_an_error() {
        let table = RawTable::from_reader("income,age\n1000,20\n".as_bytes()).unwrap();
        let err = train_from_table(&table, 42, 0.2).unwrap_err();
        assert!(matches!(err, PipelineError::MissingOutcome(_)));
    }

    #[test]
    fn test_legacy_target_name_is_recognized() {
        let table = RawTable::from_reader(
            "income,age,target\n1000,20,0\n2000,30,1\n1500,25,0\n3000,40,1\n".as_bytes(),
        )
        .unwrap();
        assert!(train_from_table(&table, 42, 0.2).is_ok());
    }

    #[test]
    fn test_positive_label_follows_data_label_space() {
        // 0/3 label space, as some source exports encode default severity
        let table = RawTable::from_reader(
            "income,outcome\n1000,0\n1100,0\n900,3\n950,3\n1050,0\n980,3\n".as_bytes(),
        )
        .unwrap();
        let report = train_from_table(&table, 42, 0.2).unwrap();
        assert_eq!(report.artifact.classifier.positive_label, 3);
    }

    #[test]
    fn test_stratified_split_is_deterministic_and_stratified() {
        let labels: Vec<i64> = (0..50).map(|i| i64::from(i % 5 == 0)).collect();
        let (train_a, test_a) = stratified_split(&labels, 0.2, 42);
        let (train_b, test_b) = stratified_split(&labels, 0.2, 42);
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        // 10 positives -> 2 held out; 40 negatives -> 8 held out
        let test_pos = test_a.iter().filter(|i| labels[**i] == 1).count();
        assert_eq!(test_pos, 2);
        assert_eq!(test_a.len(), 10);
        assert_eq!(train_a.len() + test_a.len(), labels.len());
    }

    #[test]
    fn test_split_never_holds_out_an_entire_group() {
        let labels = vec![0, 0, 0, 0, 1];
        let (train, test) = stratified_split(&labels, 0.9, 42);
        assert!(train.iter().any(|i| labels[*i] == 1) || test.len() < labels.len());
        assert!(!train.is_empty());
        // the single positive stays in train (holdout rounds to 1 but is clamped)
        assert!(train.contains(&4) || test.contains(&4));
    }
}
