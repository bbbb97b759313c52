//! Untyped tabular container for CSV inputs

use std::io::Read;
use std::path::Path;

use crate::error::PipelineError;

/// A CSV loaded as strings: a header row plus row-major cells.
///
/// All cell values stay untyped until a stage coerces them; ragged rows are
/// padded with empty cells so every row has header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Load a table from a CSV file. A missing file is a stage-fatal error.
    pub fn from_csv_path(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a table from any reader (first record is the header)
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(RawTable { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact-name column lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Case-insensitive exact-name column lookup
    pub fn column_index_ci(&self, name: &str) -> Option<usize> {
        let lowered = name.to_lowercase();
        self.columns
            .iter()
            .position(|c| c.to_lowercase() == lowered)
    }

    /// All cell values of one column, top to bottom
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[index].as_str())
    }

    /// One column parsed as numbers; non-parseable cells become None
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(self.column_cells(index).map(parse_numeric).collect())
    }

    /// One column as trimmed strings; empty cells become None
    pub fn string_column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let index = self.column_index(name)?;
        Some(
            self.column_cells(index)
                .map(|cell| {
                    let trimmed = cell.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        Some(trimmed.to_string())
                    }
                })
                .collect(),
        )
    }
}

/// Parse one cell as a number; empty and malformed cells are missing
pub fn parse_numeric(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
