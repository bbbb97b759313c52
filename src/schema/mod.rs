//! Raw tabular schema handling
//!
//! Raw input CSVs carry unconstrained column names. This module loads them
//! into an untyped [`RawTable`] and resolves canonical fields against a
//! priority-ordered candidate list.

pub mod mapping;
pub mod raw_table;

pub use mapping::{resolve_columns, ColumnResolution, FieldCandidates, COLUMN_CANDIDATES};
pub use raw_table::{parse_numeric, RawTable};
