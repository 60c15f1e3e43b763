//! Writing parsed rows into the reconciled table.

use tracing::{debug, warn};

use crate::config::TargetLocation;
use crate::db::{SqlExecutor, SqlParam};
use crate::error::IngestError;
use crate::parse::Report;
use crate::schema::{quote_ident, ColumnSpec};

/// The INSERT statement shared by every row of one run: normalized column
/// names in header order, one placeholder per column.
pub fn insert_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let names: Vec<String> = columns
        .iter()
        .map(|spec| quote_ident(&spec.name))
        .collect();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Encode one cell for binding: a zero-length value becomes SQL NULL,
/// anything else has its single-quote characters deleted (not escaped —
/// the upstream report contract strips them) and binds as text.
pub fn encode_cell(cell: &str) -> SqlParam {
    if cell.is_empty() {
        None
    } else {
        Some(cell.replace('\'', ""))
    }
}

/// Insert every row of `report` into `target.table`, one statement per row
/// in parsed order, all inside a single transaction. A failed row rolls the
/// run back (best effort) and surfaces as `Insert { row }`.
pub async fn insert_all(
    executor: &mut dyn SqlExecutor,
    target: &TargetLocation,
    columns: &[ColumnSpec],
    report: &Report,
) -> Result<u64, IngestError> {
    let statement = insert_sql(&target.table, columns);

    executor
        .execute("START TRANSACTION", &[])
        .await
        .map_err(IngestError::Transaction)?;

    let mut inserted = 0u64;
    for (row_index, row) in report.rows.iter().enumerate() {
        let params: Vec<SqlParam> = row.iter().map(|cell| encode_cell(cell)).collect();
        debug!(sql = %statement, params = ?params, row = row_index, "insert");

        if let Err(source) = executor.execute(&statement, &params).await {
            if let Err(rollback_err) = executor.execute("ROLLBACK", &[]).await {
                warn!(error = %rollback_err, "rollback after failed insert also failed");
            }
            return Err(IngestError::Insert {
                row: row_index,
                source,
            });
        }
        inserted += 1;
    }

    executor
        .execute("COMMIT", &[])
        .await
        .map_err(IngestError::Transaction)?;
    Ok(inserted)
}
