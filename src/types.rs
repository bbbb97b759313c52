//! Core types for the Crivo pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: canonical records, engineered feature records, and the bucket
//! categoricals used by the model.

use serde::{Deserialize, Serialize};

/// The six fields every cleaned record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Income,
    Age,
    CreditScore,
    LoanValue,
    MonthsOverdue,
    Outcome,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Income => "income",
            CanonicalField::Age => "age",
            CanonicalField::CreditScore => "credit_score",
            CanonicalField::LoanValue => "loan_value",
            CanonicalField::MonthsOverdue => "months_overdue",
            CanonicalField::Outcome => "outcome",
        }
    }

    /// Imputation constant used when the entire source column is missing
    pub fn fallback(&self) -> f64 {
        match self {
            CanonicalField::Income => 0.0,
            CanonicalField::Age => 25.0,
            CanonicalField::CreditScore => 600.0,
            CanonicalField::LoanValue => 10000.0,
            CanonicalField::MonthsOverdue => 0.0,
            CanonicalField::Outcome => 0.0,
        }
    }
}

/// A fully-imputed borrower record on the canonical schema.
///
/// Invariant: every field is populated; no missing values survive the cleaner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Monthly income (currency units, >= 0)
    pub income: f64,
    /// Age in years
    pub age: f64,
    /// Credit score on an integer-like 0-1000 scale
    pub credit_score: f64,
    /// Financed loan amount (currency units)
    pub loan_value: f64,
    /// Count of months currently in arrears
    pub months_overdue: f64,
    /// Binary default label (0 = good standing)
    pub outcome: i64,
}

/// Age partition used as a categorical modeling feature.
///
/// Boundaries are right-edge inclusive: an age exactly on a boundary belongs
/// to the lower bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "<=24")]
    UpTo24,
    #[serde(rename = "25-34")]
    From25To34,
    #[serde(rename = "35-44")]
    From35To44,
    #[serde(rename = "45-54")]
    From45To54,
    #[serde(rename = "55+")]
    Over55,
}

impl AgeBucket {
    /// Total partition: every non-negative age maps to exactly one bucket
    pub fn from_age(age: f64) -> Self {
        if age <= 24.0 {
            AgeBucket::UpTo24
        } else if age <= 34.0 {
            AgeBucket::From25To34
        } else if age <= 44.0 {
            AgeBucket::From35To44
        } else if age <= 54.0 {
            AgeBucket::From45To54
        } else {
            AgeBucket::Over55
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBucket::UpTo24 => "<=24",
            AgeBucket::From25To34 => "25-34",
            AgeBucket::From35To44 => "35-44",
            AgeBucket::From45To54 => "45-54",
            AgeBucket::Over55 => "55+",
        }
    }
}

/// Credit-score partition used as a categorical modeling feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBucket {
    #[serde(rename = "baixo")]
    Baixo,
    #[serde(rename = "medio-baixo")]
    MedioBaixo,
    #[serde(rename = "medio")]
    Medio,
    #[serde(rename = "alto")]
    Alto,
    #[serde(rename = "excelente")]
    Excelente,
}

impl ScoreBucket {
    /// Total partition: every non-negative score maps to exactly one bucket
    pub fn from_score(score: f64) -> Self {
        if score <= 550.0 {
            ScoreBucket::Baixo
        } else if score <= 650.0 {
            ScoreBucket::MedioBaixo
        } else if score <= 750.0 {
            ScoreBucket::Medio
        } else if score <= 850.0 {
            ScoreBucket::Alto
        } else {
            ScoreBucket::Excelente
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBucket::Baixo => "baixo",
            ScoreBucket::MedioBaixo => "medio-baixo",
            ScoreBucket::Medio => "medio",
            ScoreBucket::Alto => "alto",
            ScoreBucket::Excelente => "excelente",
        }
    }
}

/// Canonical record plus engineered features, as persisted to the features CSV.
///
/// The flag fields are written as 0/1 integers. `months_overdue`,
/// `overdue_flag` and `serious_arrears` are carried through the file but are
/// stripped by the leakage filter before modeling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub income: f64,
    pub age: f64,
    pub credit_score: f64,
    pub loan_value: f64,
    pub months_overdue: f64,
    /// Loan amount relative to annualized income
    pub loan_to_income: f64,
    /// Installment under a fixed 5-year amortization assumption
    pub estimated_monthly_payment: f64,
    /// Share of monthly income committed to the installment
    pub pct_income_commitment: f64,
    pub overdue_flag: u8,
    pub serious_arrears: u8,
    pub age_bucket: AgeBucket,
    pub score_bucket: ScoreBucket,
    pub outcome: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_age_buckets_are_a_total_partition() {
        for tenths in 0..2000 {
            let age = tenths as f64 / 10.0;
            // from_age always returns exactly one bucket; spot-check ordering
            let bucket = AgeBucket::from_age(age);
            if age <= 24.0 {
                assert_eq!(bucket, AgeBucket::UpTo24, "age {}", age);
            } else if age > 54.0 {
                assert_eq!(bucket, AgeBucket::Over55, "age {}", age);
            }
        }
    }

    #[test]
    fn test_age_bucket_boundary_is_right_inclusive() {
        assert_eq!(AgeBucket::from_age(24.0), AgeBucket::UpTo24);
        assert_eq!(AgeBucket::from_age(25.0), AgeBucket::From25To34);
        assert_eq!(AgeBucket::from_age(34.0), AgeBucket::From25To34);
        assert_eq!(AgeBucket::from_age(54.0), AgeBucket::From45To54);
        assert_eq!(AgeBucket::from_age(55.0), AgeBucket::Over55);
    }

    #[test]
    fn test_score_bucket_boundary_is_right_inclusive() {
        assert_eq!(ScoreBucket::from_score(0.0), ScoreBucket::Baixo);
        assert_eq!(ScoreBucket::from_score(550.0), ScoreBucket::Baixo);
        assert_eq!(ScoreBucket::from_score(551.0), ScoreBucket::MedioBaixo);
        assert_eq!(ScoreBucket::from_score(650.0), ScoreBucket::MedioBaixo);
        assert_eq!(ScoreBucket::from_score(750.0), ScoreBucket::Medio);
        assert_eq!(ScoreBucket::from_score(850.0), ScoreBucket::Alto);
        assert_eq!(ScoreBucket::from_score(999.0), ScoreBucket::Excelente);
    }

    #[test]
    fn test_score_buckets_cover_full_range() {
        for score in 0..1000 {
            // Must never panic and must land in exactly one variant
            let _ = ScoreBucket::from_score(score as f64);
        }
    }

    #[test]
    fn test_bucket_serde_labels() {
        let json = serde_json::to_string(&AgeBucket::From25To34).unwrap();
        assert_eq!(json, "\"25-34\"");
        let json = serde_json::to_string(&ScoreBucket::MedioBaixo).unwrap();
        assert_eq!(json, "\"medio-baixo\"");
        let back: ScoreBucket = serde_json::from_str("\"excelente\"").unwrap();
        assert_eq!(back, ScoreBucket::Excelente);
    }
}
