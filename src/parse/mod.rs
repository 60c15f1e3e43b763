//! Turning raw delimited text into a row-and-column shape.

use crate::error::IngestError;

/// One parsed report: column names verbatim from the header line, and data
/// rows aligned positionally with it.
///
/// Invariant: every row has exactly `columns.len()` cells. The csv reader
/// enforces this (ragged records are an error), so downstream code can index
/// rows by header position without checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Report {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Parse delimited text. The first line is the header; each subsequent line
/// is one data row. Empty fields are preserved as empty strings (nulling them
/// is the writer's job, not ours). Header-only or blank content fails with
/// `EmptySource`.
pub fn parse(text: &str) -> Result<Report, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    if rows.is_empty() {
        return Err(IngestError::EmptySource);
    }
    Ok(Report { columns, rows })
}
