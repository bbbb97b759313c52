//! Column mapping and cleaning
//!
//! First pipeline stage: maps heterogeneous raw columns onto the canonical
//! six-field schema, coerces types, imputes missing values and derives the
//! outcome label when no source column carries one. Schema gaps are never
//! fatal once the raw file exists; the output is degraded but complete.

use log::{info, warn};

use crate::schema::{parse_numeric, resolve_columns, ColumnResolution, RawTable};
use crate::types::{CanonicalField, CanonicalRecord};

/// Tokens coerced to outcome 1 (case-insensitive, trimmed)
const TRUTHY_TOKENS: &[&str] = &["1", "true", "yes", "y"];

/// Tokens coerced to outcome 0
const FALSY_TOKENS: &[&str] = &["0", "false", "no", "n"];

/// Minimum months in arrears that counts as a default for the proxy label
pub const PROXY_ARREARS_THRESHOLD: f64 = 3.0;

/// Cleaner output: imputed records plus the mapping that produced them
#[derive(Debug, Clone)]
pub struct CleanOutput {
    pub records: Vec<CanonicalRecord>,
    pub resolutions: Vec<ColumnResolution>,
}

/// Map, coerce and impute one raw table into canonical records.
///
/// The mapping summary is logged at info level; every schema gap is logged
/// at warn level and filled with a degraded default.
pub fn clean(table: &RawTable) -> CleanOutput {
    let resolutions = resolve_columns(table);

    info!("Column mapping (None = not found):");
    for resolution in &resolutions {
        info!(
            "  {}: {}",
            resolution.field.as_str(),
            resolution.source.as_deref().unwrap_or("None")
        );
    }
    let missing: Vec<&str> = resolutions
        .iter()
        .filter(|r| !r.is_resolved())
        .map(|r| r.field.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(
            "Not all canonical columns were found in the raw file: {}",
            missing.join(", ")
        );
    }

    let income = numeric_field(table, &resolutions, CanonicalField::Income);
    let age = numeric_field(table, &resolutions, CanonicalField::Age);
    let credit_score = numeric_field(table, &resolutions, CanonicalField::CreditScore);
    let loan_value = numeric_field(table, &resolutions, CanonicalField::LoanValue);
    let months_overdue = numeric_field(table, &resolutions, CanonicalField::MonthsOverdue);
    let outcome = outcome_field(table, &resolutions, &months_overdue);

    let income = impute_with_median(income, CanonicalField::Income);
    let age = impute_with_median(age, CanonicalField::Age);
    let credit_score = impute_with_median(credit_score, CanonicalField::CreditScore);
    let loan_value = impute_with_median(loan_value, CanonicalField::LoanValue);

    let records = (0..table.len())
        .map(|i| CanonicalRecord {
            income: income[i],
            age: age[i],
            credit_score: credit_score[i],
            loan_value: loan_value[i],
            // Months in arrears defaults to 0, not to a median
            months_overdue: months_overdue[i].unwrap_or(0.0),
            outcome: outcome[i],
        })
        .collect();

    CleanOutput {
        records,
        resolutions,
    }
}

/// Pull one numeric field through the resolved mapping; an unresolved field
/// yields an all-missing column.
fn numeric_field(
    table: &RawTable,
    resolutions: &[ColumnResolution],
    field: CanonicalField,
) -> Vec<Option<f64>> {
    match resolved_source(resolutions, field) {
        Some(source) => table
            .numeric_column(source)
            .unwrap_or_else(|| vec![None; table.len()]),
        None => vec![None; table.len()],
    }
}

fn resolved_source(resolutions: &[ColumnResolution], field: CanonicalField) -> Option<&str> {
    resolutions
        .iter()
        .find(|r| r.field == field)
        .and_then(|r| r.source.as_deref())
}

/// Coerce the outcome column, or derive a proxy label when it is absent.
fn outcome_field(
    table: &RawTable,
    resolutions: &[ColumnResolution],
    months_overdue: &[Option<f64>],
) -> Vec<i64> {
    match resolved_source(resolutions, CanonicalField::Outcome) {
        Some(source) => match table.column_index(source) {
            Some(index) => table
                .column_cells(index)
                .map(|cell| {
                    coerce_outcome_token(cell)
                        .map(|v| v.round() as i64)
                        .unwrap_or(0)
                })
                .collect(),
            None => vec![0; table.len()],
        },
        None => {
            if resolved_source(resolutions, CanonicalField::MonthsOverdue).is_some() {
                warn!(
                    "Outcome column not found: deriving proxy outcome = months_overdue >= {}",
                    PROXY_ARREARS_THRESHOLD
                );
                months_overdue
                    .iter()
                    .map(|m| match m {
                        Some(v) if *v >= PROXY_ARREARS_THRESHOLD => 1,
                        _ => 0,
                    })
                    .collect()
            } else {
                warn!("Neither outcome nor months-overdue columns found; outcome filled with zeros");
                vec![0; table.len()]
            }
        }
    }
}

/// Map truthy/falsy tokens to 1/0; any other token falls back to numeric
/// coercion and remains missing if unparseable.
fn coerce_outcome_token(cell: &str) -> Option<f64> {
    let token = cell.trim().to_lowercase();
    if TRUTHY_TOKENS.contains(&token.as_str()) {
        Some(1.0)
    } else if FALSY_TOKENS.contains(&token.as_str()) {
        Some(0.0)
    } else {
        parse_numeric(cell)
    }
}

/// Fill missing values with the column median, falling back to the field's
/// fixed constant when the whole column is missing.
fn impute_with_median(values: Vec<Option<f64>>, field: CanonicalField) -> Vec<f64> {
    let fill = median(values.iter().filter_map(|v| *v)).unwrap_or_else(|| field.fallback());
    values.into_iter().map(|v| v.unwrap_or(fill)).collect()
}

/// Median of the present values; the mean of the two middle values for
/// even-sized samples. None for an empty sample.
pub fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(csv: &str) -> RawTable {
        RawTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_fully_parsable_rows_have_no_missing_values() {
        let output = clean(&table(
            "annual_income,age,credit_score,loan_amount,months_late,default\n\
             30000,22,650,30000,0,0\n\
             4500,35,720,15000,1,1\n",
        ));
        assert_eq!(output.records.len(), 2);
        assert_eq!(
            output.records[0],
            CanonicalRecord {
                income: 30000.0,
                age: 22.0,
                credit_score: 650.0,
                loan_value: 30000.0,
                months_overdue: 0.0,
                outcome: 0,
            }
        );
        assert_eq!(output.records[1].outcome, 1);
    }

    #[test]
    fn test_median_imputation_for_missing_cells() {
        let output = clean(&table(
            "renda,idade,score,valor,months_late,target\n\
             1000,20,600,5000,0,0\n\
             2000,30,700,9000,0,0\n\
             ,40,800,13000,0,1\n",
        ));
        // median of [1000, 2000] = 1500
        assert_eq!(output.records[2].income, 1500.0);
    }

    #[test]
    fn test_even_sized_median_is_mean_of_middles() {
        assert_eq!(median([1.0, 2.0, 3.0, 4.0].into_iter()), Some(2.5));
        assert_eq!(median([3.0].into_iter()), Some(3.0));
        assert_eq!(median(std::iter::empty()), None);
    }

    #[test]
    fn test_fallback_constants_when_column_entirely_missing() {
        let output = clean(&table("months_late,target\n2,0\n"));
        let record = &output.records[0];
        assert_eq!(record.income, 0.0);
        assert_eq!(record.age, 25.0);
        assert_eq!(record.credit_score, 600.0);
        assert_eq!(record.loan_value, 10000.0);
    }

    #[test]
    fn test_outcome_token_coercion() {
        let output = clean(&table(
            "renda,idade,score,valor,months_late,default\n\
             1000,20,600,5000,0,YES\n\
             1000,20,600,5000,0, No \n\
             1000,20,600,5000,0,3\n\
             1000,20,600,5000,0,whatever\n",
        ));
        let outcomes: Vec<i64> = output.records.iter().map(|r| r.outcome).collect();
        // truthy, falsy, numeric passthrough, unparseable -> 0
        assert_eq!(outcomes, vec![1, 0, 3, 0]);
    }

    #[test]
    fn test_proxy_outcome_from_arrears() {
        let output = clean(&table(
            "renda,idade,score,valor,months_late\n\
             1000,20,600,5000,0\n\
             1000,20,600,5000,3\n\
             1000,20,600,5000,7\n",
        ));
        let outcomes: Vec<i64> = output.records.iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes, vec![0, 1, 1]);
    }

    #[test]
    fn test_degenerate_all_zero_outcome() {
        let output = clean(&table("renda,idade\n1000,20\n1000,30\n"));
        assert!(output.records.iter().all(|r| r.outcome == 0));
        assert!(output.records.iter().all(|r| r.months_overdue == 0.0));
    }

    #[test]
    fn test_months_overdue_imputed_with_zero_not_median() {
        let output = clean(&table(
            "renda,idade,score,valor,months_late,target\n\
             1000,20,600,5000,5,0\n\
             1000,20,600,5000,5,0\n\
             1000,20,600,5000,,0\n",
        ));
        assert_eq!(output.records[2].months_overdue, 0.0);
    }
}
