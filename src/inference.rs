//! Single-record inference
//!
//! Serving path: build the engineered features for one ad-hoc applicant with
//! the exact training-time formulas, one-hot encode the buckets, then
//! reconcile against the artifact's `model_cols`. The reconciliation is the
//! correctness core: a fitted linear model is order- and
//! completeness-sensitive to its inputs, and misalignment produces silently
//! wrong predictions rather than errors.
//!
//! The artifact is an explicit handle loaded by the caller; nothing here
//! reads ambient process state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::features;
use crate::model::preprocess::indicator_name;
use crate::model::ModelArtifact;
use crate::types::CanonicalRecord;

/// The five fields an applicant enters ad hoc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantInput {
    pub income: f64,
    pub age: f64,
    pub credit_score: f64,
    pub loan_value: f64,
    pub months_overdue: f64,
}

/// Served classification, as data for the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "verdict", content = "label")]
pub enum Verdict {
    /// Predicted label 0
    GoodStanding,
    /// Predicted the trained positive label
    Delinquent(i64),
    /// A label outside the recognized outcome codes; surfaced, not an error
    Unexpected(i64),
}

/// Full assessment for one applicant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub verdict: Verdict,
    /// Probability of the positive class
    pub probability: f64,
}

/// Engineered single-row feature map, keyed by feature/indicator name.
///
/// Reuses [`features::engineer`]; with a single record the population median
/// income is the record's own income. Bucket categoricals become
/// `column=category` indicators valued 1.0.
pub fn feature_row(input: &ApplicantInput) -> BTreeMap<String, f64> {
    let canonical = CanonicalRecord {
        income: input.income,
        age: input.age,
        credit_score: input.credit_score,
        loan_value: input.loan_value,
        months_overdue: input.months_overdue,
        outcome: 0,
    };
    let engineered = features::engineer(&canonical, canonical.income);

    let mut row = BTreeMap::new();
    row.insert("income".to_string(), engineered.income);
    row.insert("age".to_string(), engineered.age);
    row.insert("credit_score".to_string(), engineered.credit_score);
    row.insert("loan_value".to_string(), engineered.loan_value);
    row.insert("months_overdue".to_string(), engineered.months_overdue);
    row.insert("loan_to_income".to_string(), engineered.loan_to_income);
    row.insert(
        "estimated_monthly_payment".to_string(),
        engineered.estimated_monthly_payment,
    );
    row.insert(
        "pct_income_commitment".to_string(),
        engineered.pct_income_commitment,
    );
    row.insert("overdue_flag".to_string(), f64::from(engineered.overdue_flag));
    row.insert(
        "serious_arrears".to_string(),
        f64::from(engineered.serious_arrears),
    );
    row.insert(
        indicator_name("age_bucket", engineered.age_bucket.as_str()),
        1.0,
    );
    row.insert(
        indicator_name("score_bucket", engineered.score_bucket.as_str()),
        1.0,
    );
    row
}

/// Reconcile a named feature map against the artifact's expected columns:
/// expected columns absent from the row become 0, extraneous entries are
/// dropped, and the output order is exactly `model_cols`.
pub fn align_columns(row: &BTreeMap<String, f64>, model_cols: &[String]) -> Vec<f64> {
    model_cols
        .iter()
        .map(|col| row.get(col).copied().unwrap_or(0.0))
        .collect()
}

/// Score one applicant against a loaded artifact
pub fn score(artifact: &ModelArtifact, input: &ApplicantInput) -> Result<Assessment, PipelineError> {
    let row = feature_row(input);
    let aligned = align_columns(&row, &artifact.model_cols);
    let probability = artifact.predict_proba(&aligned)?;
    let label = artifact.predict_label(&aligned)?;

    let verdict = if label == 0 {
        Verdict::GoodStanding
    } else if label == artifact.classifier.positive_label {
        Verdict::Delinquent(label)
    } else {
        Verdict::Unexpected(label)
    };

    Ok(Assessment {
        verdict,
        probability,
    })
}
