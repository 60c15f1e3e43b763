use thiserror::Error;

/// Everything that can abort an ingestion run.
///
/// Each pipeline phase classifies its own failures; the binary wraps
/// whichever kind surfaces into a single "ingestion run failed" context.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Listing or fetching from the object store failed.
    #[error("object storage unavailable: {0}")]
    StorageUnavailable(#[from] object_store::Error),

    /// No candidate object under the prefix, or the latest one held no data.
    #[error("no report available: prefix empty or latest object has no rows")]
    EmptySource,

    /// The report decoded to text but could not be read as delimited rows.
    #[error("malformed report: {0}")]
    Malformed(#[from] csv::Error),

    /// DDL or an existence check failed while ensuring the destination.
    #[error("schema reconciliation failed: {0}")]
    Schema(#[source] anyhow::Error),

    /// The destination table already exists with a different column set.
    #[error("table `{table}` exists with columns {found:?}, report has {expected:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A single row's INSERT failed. `row` is the zero-based index into the
    /// parsed report.
    #[error("insert failed at row {row}: {source}")]
    Insert {
        row: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Opening or committing the run's transaction failed.
    #[error("transaction control failed: {0}")]
    Transaction(#[source] anyhow::Error),
}
