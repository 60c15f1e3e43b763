use anyhow::{Context, Result};
use std::env;

/// Where the rows end up. Resolved once per run and stable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLocation {
    pub database: String,
    pub table: String,
}

/// Everything one run needs, resolved from the environment before the
/// pipeline starts. No process-wide singletons; the driver takes this by
/// value.
#[derive(Debug, Clone)]
pub struct Config {
    /// Object-store bucket holding the report snapshots.
    pub bucket: String,
    /// Key prefix the reports are written under.
    pub prefix: String,
    /// MySQL endpoint.
    pub db_host: String,
    pub db_user: String,
    pub db_password: String,
    /// Destination database/table.
    pub target: TargetLocation,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `TARGET_DATABASE` / `TARGET_TABLE` default to the bucket and prefix
    /// names, which is how the upstream report producers lay things out.
    pub fn from_env() -> Result<Self> {
        let bucket = env::var("S3_BUCKET_NAME").context("S3_BUCKET_NAME not set")?;
        let prefix = env::var("S3_PREFIX_NAME").context("S3_PREFIX_NAME not set")?;
        let db_host = env::var("MYSQL_HOST_NAME").context("MYSQL_HOST_NAME not set")?;
        let db_user = env::var("MYSQL_USERNAME").context("MYSQL_USERNAME not set")?;
        let db_password = env::var("MYSQL_PASSWORD").context("MYSQL_PASSWORD not set")?;

        let database = env::var("TARGET_DATABASE").unwrap_or_else(|_| bucket.clone());
        let table = env::var("TARGET_TABLE").unwrap_or_else(|_| prefix.clone());

        Ok(Self {
            bucket,
            prefix,
            db_host,
            db_user,
            db_password,
            target: TargetLocation { database, table },
        })
    }
}
