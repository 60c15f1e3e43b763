//! Idempotent ensure-exists for the destination database and table.

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::config::TargetLocation;
use crate::db::SqlExecutor;
use crate::error::IngestError;

use super::{
    create_database_sql, create_table_sql, show_columns_sql, show_databases_sql, show_tables_sql,
    use_database_sql, ColumnSpec,
};

/// Where reconciliation currently stands while walking the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    Unknown,
    DbMissing,
    TableMissing,
    Ready,
}

/// Outcome of one reconcile pass. `ready` is true only when both database
/// and table are confirmed present with a compatible column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub ready: bool,
    pub created_database: bool,
    pub created_table: bool,
}

/// Ensure `target` exists with `columns`, creating database and/or table as
/// needed. Safe to call on every run: all DDL is `IF NOT EXISTS`, and a
/// second pass over an already-provisioned target performs no writes.
///
/// A pre-existing table whose column set differs from the report's fails
/// with `SchemaMismatch` rather than being silently trusted.
pub async fn reconcile(
    executor: &mut dyn SqlExecutor,
    target: &TargetLocation,
    columns: &[ColumnSpec],
) -> Result<ReconciliationResult, IngestError> {
    // `id` is reserved for the synthetic primary key; a report header that
    // normalizes to it would create a duplicate column and corrupt the
    // mismatch comparison.
    if columns.iter().any(|spec| spec.name == "id") {
        return Err(IngestError::Schema(anyhow!(
            "report header normalizes to reserved column name `id`"
        )));
    }

    let mut created_database = false;
    let mut created_table = false;
    let mut state = SchemaState::Unknown;

    let ready = loop {
        debug!(?state, database = %target.database, table = %target.table, "reconcile step");
        state = match state {
            SchemaState::Unknown => {
                if database_exists(executor, &target.database)
                    .await
                    .map_err(IngestError::Schema)?
                {
                    use_database(executor, &target.database)
                        .await
                        .map_err(IngestError::Schema)?;
                    if table_exists(executor, &target.table)
                        .await
                        .map_err(IngestError::Schema)?
                    {
                        verify_columns(executor, target, columns).await?;
                        SchemaState::Ready
                    } else {
                        SchemaState::TableMissing
                    }
                } else {
                    SchemaState::DbMissing
                }
            }

            SchemaState::DbMissing => {
                info!(database = %target.database, "database missing, creating");
                executor
                    .execute(&create_database_sql(&target.database), &[])
                    .await
                    .map_err(IngestError::Schema)?;
                created_database = true;
                use_database(executor, &target.database)
                    .await
                    .map_err(IngestError::Schema)?;
                executor
                    .execute(&create_table_sql(&target.table, columns), &[])
                    .await
                    .map_err(IngestError::Schema)?;
                created_table = true;

                // Re-verify both after creation.
                let db_ok = database_exists(executor, &target.database)
                    .await
                    .map_err(IngestError::Schema)?;
                let table_ok = table_exists(executor, &target.table)
                    .await
                    .map_err(IngestError::Schema)?;
                break db_ok && table_ok;
            }

            SchemaState::TableMissing => {
                info!(table = %target.table, "table missing, creating");
                executor
                    .execute(&create_table_sql(&target.table, columns), &[])
                    .await
                    .map_err(IngestError::Schema)?;
                created_table = true;
                break table_exists(executor, &target.table)
                    .await
                    .map_err(IngestError::Schema)?;
            }

            SchemaState::Ready => break true,
        };
    };

    info!(ready, created_database, created_table, "schema reconciled");
    Ok(ReconciliationResult {
        ready,
        created_database,
        created_table,
    })
}

async fn database_exists(executor: &mut dyn SqlExecutor, database: &str) -> Result<bool> {
    let rows = executor.fetch_strings(&show_databases_sql(database)).await?;
    Ok(!rows.is_empty())
}

async fn table_exists(executor: &mut dyn SqlExecutor, table: &str) -> Result<bool> {
    let rows = executor.fetch_strings(&show_tables_sql(table)).await?;
    Ok(!rows.is_empty())
}

async fn use_database(executor: &mut dyn SqlExecutor, database: &str) -> Result<()> {
    executor.execute(&use_database_sql(database), &[]).await?;
    Ok(())
}

/// Compare the existing table's column names (minus the synthetic `id`)
/// against the inferred set, order-insensitively. Types are not compared:
/// every inferred column is the same fixed-width type by construction.
async fn verify_columns(
    executor: &mut dyn SqlExecutor,
    target: &TargetLocation,
    columns: &[ColumnSpec],
) -> Result<(), IngestError> {
    let found: Vec<String> = executor
        .fetch_strings(&show_columns_sql(&target.table))
        .await
        .map_err(IngestError::Schema)?
        .into_iter()
        .filter(|name| name != "id")
        .collect();
    let expected: Vec<String> = columns.iter().map(|spec| spec.name.clone()).collect();

    let mut found_sorted = found.clone();
    let mut expected_sorted = expected.clone();
    found_sorted.sort();
    expected_sorted.sort();

    if found_sorted != expected_sorted {
        return Err(IngestError::SchemaMismatch {
            table: target.table.clone(),
            expected,
            found,
        });
    }
    Ok(())
}
