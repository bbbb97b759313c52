//! Feature engineering
//!
//! Second pipeline stage: derives the engineered modeling features from
//! canonical records using fixed formulas and fixed bucket boundaries.
//! Income is treated as monthly throughout; the inference adapter calls the
//! same [`engineer`] function, so the formulas cannot drift between training
//! and serving.

use log::warn;

use crate::cleaner::{median, PROXY_ARREARS_THRESHOLD};
use crate::schema::RawTable;
use crate::types::{AgeBucket, CanonicalRecord, FeatureRecord, ScoreBucket};

/// Amortization horizon for the estimated installment (5 years)
pub const AMORTIZATION_MONTHS: f64 = 60.0;

/// Guard added to fallback divisors so a zero median still divides cleanly
const DIVISOR_EPSILON: f64 = 1e-6;

/// Derive the full feature set for a batch of canonical records.
///
/// The population median income feeds the zero-income fallback divisors.
pub fn build_features(records: &[CanonicalRecord]) -> Vec<FeatureRecord> {
    let median_income = median(records.iter().map(|r| r.income)).unwrap_or(0.0);
    records
        .iter()
        .map(|record| engineer(record, median_income))
        .collect()
}

/// Apply every feature formula to one record.
///
/// `median_income` is the population-level fallback used when the record's
/// own income is zero; ratios never produce infinity or NaN.
pub fn engineer(record: &CanonicalRecord, median_income: f64) -> FeatureRecord {
    let annual_income = record.income * 12.0;
    let loan_to_income = if annual_income == 0.0 {
        record.loan_value / (median_income * 12.0 + DIVISOR_EPSILON)
    } else {
        record.loan_value / annual_income
    };

    let estimated_monthly_payment = record.loan_value / AMORTIZATION_MONTHS;

    let pct_income_commitment = if record.income == 0.0 {
        estimated_monthly_payment / (median_income + DIVISOR_EPSILON)
    } else {
        estimated_monthly_payment / record.income
    };

    FeatureRecord {
        income: record.income,
        age: record.age,
        credit_score: record.credit_score,
        loan_value: record.loan_value,
        months_overdue: record.months_overdue,
        loan_to_income,
        estimated_monthly_payment,
        pct_income_commitment,
        overdue_flag: (record.months_overdue > 0.0) as u8,
        serious_arrears: (record.months_overdue >= PROXY_ARREARS_THRESHOLD) as u8,
        age_bucket: AgeBucket::from_age(record.age),
        score_bucket: ScoreBucket::from_score(record.credit_score),
        outcome: record.outcome,
    }
}

/// Read canonical records back out of the cleaned CSV.
///
/// Defensive: a canonical column absent from the file is synthesized as 0 so
/// the stage never fails on schema gaps once the input file exists.
pub fn canonical_rows(table: &RawTable) -> Vec<CanonicalRecord> {
    let column = |name: &str| -> Vec<f64> {
        match table.numeric_column(name) {
            Some(values) => values.into_iter().map(|v| v.unwrap_or(0.0)).collect(),
            None => {
                warn!("Cleaned input is missing column '{}'; filling with 0", name);
                vec![0.0; table.len()]
            }
        }
    };

    let income = column("income");
    let age = column("age");
    let credit_score = column("credit_score");
    let loan_value = column("loan_value");
    let months_overdue = column("months_overdue");
    let outcome = column("outcome");

    (0..table.len())
        .map(|i| CanonicalRecord {
            income: income[i],
            age: age[i],
            credit_score: credit_score[i],
            loan_value: loan_value[i],
            months_overdue: months_overdue[i],
            outcome: outcome[i].round() as i64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    fn record(income: f64, age: f64, score: f64, loan: f64, months: f64) -> CanonicalRecord {
        CanonicalRecord {
            income,
            age,
            credit_score: score,
            loan_value: loan,
            months_overdue: months,
            outcome: 0,
        }
    }

    #[test]
    fn test_dashboard_default_inputs() {
        // income 2500 / age 22 / score 650 / loan 30000 / 0 months overdue
        let features = engineer(&record(2500.0, 22.0, 650.0, 30000.0, 0.0), 2500.0);
        assert_relative_eq!(features.loan_to_income, 1.0);
        assert_relative_eq!(features.estimated_monthly_payment, 500.0);
        assert_relative_eq!(features.pct_income_commitment, 0.2);
        assert_eq!(features.age_bucket, AgeBucket::UpTo24);
        assert_eq!(features.score_bucket, ScoreBucket::MedioBaixo);
        assert_eq!(features.overdue_flag, 0);
        assert_eq!(features.serious_arrears, 0);
    }

    #[test]
    fn test_zero_income_uses_population_fallback() {
        let features = engineer(&record(0.0, 40.0, 700.0, 12000.0, 0.0), 2000.0);
        assert!(features.loan_to_income.is_finite());
        assert!(features.pct_income_commitment.is_finite());
        assert_relative_eq!(
            features.loan_to_income,
            12000.0 / (2000.0 * 12.0 + 1e-6),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            features.pct_income_commitment,
            200.0 / (2000.0 + 1e-6),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_income_and_zero_median_never_produce_non_finite() {
        let batch = vec![record(0.0, 30.0, 500.0, 8000.0, 1.0)];
        let features = build_features(&batch);
        assert!(features[0].loan_to_income.is_finite());
        assert!(features[0].pct_income_commitment.is_finite());
    }

    #[test]
    fn test_overdue_flags() {
        let features = engineer(&record(1000.0, 30.0, 600.0, 5000.0, 1.0), 1000.0);
        assert_eq!(features.overdue_flag, 1);
        assert_eq!(features.serious_arrears, 0);

        let features = engineer(&record(1000.0, 30.0, 600.0, 5000.0, 3.0), 1000.0);
        assert_eq!(features.serious_arrears, 1);
    }

    #[test]
    fn test_build_features_uses_batch_median_income() {
        let batch = vec![
            record(0.0, 30.0, 600.0, 24000.0, 0.0),
            record(1000.0, 30.0, 600.0, 5000.0, 0.0),
            record(3000.0, 30.0, 600.0, 5000.0, 0.0),
        ];
        let features = build_features(&batch);
        // median income = 1000; fallback divisor = 12000 + eps
        assert_relative_eq!(
            features[0].loan_to_income,
            24000.0 / (12000.0 + 1e-6),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_canonical_rows_synthesizes_missing_columns() {
        let table = RawTable::from_reader("income,outcome\n1500,1\n".as_bytes()).unwrap();
        let records = canonical_rows(&table);
        assert_eq!(
            records[0],
            CanonicalRecord {
                income: 1500.0,
                age: 0.0,
                credit_score: 0.0,
                loan_value: 0.0,
                months_overdue: 0.0,
                outcome: 1,
            }
        );
    }
}
