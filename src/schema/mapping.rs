//! Canonical column resolution
//!
//! Raw datasets name the same attribute in many ways. Each canonical field
//! carries a priority-ordered candidate list; resolution is a pure function
//! over the table header using case-insensitive exact matching only (no fuzzy
//! matching), first match wins.

use crate::schema::raw_table::RawTable;
use crate::types::CanonicalField;

/// Candidate source names for one canonical field, in priority order
#[derive(Debug, Clone, Copy)]
pub struct FieldCandidates {
    pub field: CanonicalField,
    pub candidates: &'static [&'static str],
}

/// The full candidate map, carried over from the source dataset conventions
/// (mixed Portuguese/English vendor exports).
pub const COLUMN_CANDIDATES: &[FieldCandidates] = &[
    FieldCandidates {
        field: CanonicalField::Income,
        candidates: &[
            "renda",
            "annual_income",
            "income",
            "income_annual",
            "monthly_income",
        ],
    },
    FieldCandidates {
        field: CanonicalField::Age,
        candidates: &["idade", "age", "years"],
    },
    FieldCandidates {
        field: CanonicalField::CreditScore,
        candidates: &["score", "credit_score", "fico", "credit_score_value"],
    },
    FieldCandidates {
        field: CanonicalField::LoanValue,
        candidates: &["loan_amount", "valor", "loan_value", "amount"],
    },
    FieldCandidates {
        field: CanonicalField::MonthsOverdue,
        candidates: &[
            "months_delayed",
            "months_in_arrears",
            "num_late_payments",
            "months_late",
        ],
    },
    FieldCandidates {
        field: CanonicalField::Outcome,
        candidates: &["default", "delinquent", "is_default", "target"],
    },
];

/// Resolution result for one canonical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnResolution {
    pub field: CanonicalField,
    /// The raw column that matched, if any
    pub source: Option<String>,
}

impl ColumnResolution {
    pub fn is_resolved(&self) -> bool {
        self.source.is_some()
    }
}

/// Resolve every canonical field against the table header.
///
/// Returns one entry per canonical field, in candidate-map order.
pub fn resolve_columns(table: &RawTable) -> Vec<ColumnResolution> {
    COLUMN_CANDIDATES
        .iter()
        .map(|entry| {
            let source = entry
                .candidates
                .iter()
                .find_map(|candidate| table.column_index_ci(candidate))
                .map(|index| table.columns[index].clone());
            ColumnResolution {
                field: entry.field,
                source,
            }
        })
        .collect()
}
