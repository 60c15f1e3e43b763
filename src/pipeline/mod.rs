//! One ingestion cycle: select the latest report, parse it, reconcile the
//! destination schema, write the rows. Owns the run's connection checkout.

use std::sync::Arc;

use anyhow::{Context, Result};
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use tracing::{error, info, warn};

use crate::config::{Config, TargetLocation};
use crate::db::{self, SqlExecutor};
use crate::error::IngestError;
use crate::schema::ColumnSpec;
use crate::{fetch, insert, parse, schema};

/// What one successful run accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Key of the ingested object.
    pub object: String,
    /// Rows written (zero when reconciliation left the target not ready).
    pub rows: u64,
}

/// The core pipeline over abstract collaborators. Fail-fast: the first
/// error from any phase aborts the run.
pub async fn ingest(
    store: &dyn ObjectStore,
    executor: &mut dyn SqlExecutor,
    prefix: &str,
    target: &TargetLocation,
) -> Result<RunSummary, IngestError> {
    let (key, text) = fetch::latest_report(store, prefix).await?;

    let report = parse::parse(&text)?;
    info!(
        object = %key,
        rows = report.row_count(),
        columns = report.columns.len(),
        "parsed report"
    );

    let columns = ColumnSpec::from_header(&report.columns);
    let reconciled = schema::reconcile(executor, target, &columns).await?;
    if !reconciled.ready {
        warn!(
            database = %target.database,
            table = %target.table,
            "destination not ready after reconciliation, skipping inserts"
        );
        return Ok(RunSummary {
            object: key,
            rows: 0,
        });
    }

    let rows = insert::insert_all(executor, target, &columns, &report).await?;
    Ok(RunSummary { object: key, rows })
}

/// One full run against the production collaborators: S3-backed object
/// store and a pooled MySQL connection. The connection checkout is scoped
/// so it is released on every exit path; the pool is closed afterwards
/// regardless of outcome.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let store: Arc<dyn ObjectStore> = Arc::new(
        AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .build()
            .context("configuring S3 object store")?,
    );
    let pool = db::connect(&config.db_host, &config.db_user, &config.db_password)
        .await
        .context("connecting to MySQL")?;

    let outcome = match pool.acquire().await {
        Ok(mut conn) => ingest(store.as_ref(), &mut conn, &config.prefix, &config.target)
            .await
            .map_err(anyhow::Error::from),
        Err(e) => Err(e).context("acquiring connection"),
    };
    pool.close().await;

    match outcome {
        Ok(summary) => {
            info!(object = %summary.object, rows = summary.rows, "ingestion complete");
            Ok(summary)
        }
        Err(e) => {
            error!(error = %e, "ingestion run failed");
            Err(e).context("ingestion run failed")
        }
    }
}
