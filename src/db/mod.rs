//! Database connectivity: the executor seam the pipeline runs against, and
//! its production implementation on a pooled sqlx MySQL connection.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::Row;

#[cfg(test)]
pub(crate) mod fake;

/// One positional bind: `None` is SQL NULL, `Some` a text value.
pub type SqlParam = Option<String>;

/// The single primitive the pipeline needs from a database connection.
/// Schema reconciliation and row writing are both expressed through it, so
/// tests can run the whole pipeline against an in-memory fake.
///
/// `?Send`: the run uses one connection serially on one task, and sqlx's
/// `Executor` impl for `&mut MySqlConnection` cannot satisfy a boxed
/// `Send` future's higher-ranked lifetime requirements.
#[async_trait(?Send)]
pub trait SqlExecutor {
    /// Execute a statement, binding `params` positionally to `?`
    /// placeholders. Returns rows affected.
    async fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64>;

    /// Run a query and return the first column of every row as text.
    async fn fetch_strings(&mut self, sql: &str) -> Result<Vec<String>>;
}

/// Open a pool against the configured MySQL endpoint. The run uses exactly
/// one connection, serially, so the pool is capped at one.
pub async fn connect(host: &str, user: &str, password: &str) -> Result<MySqlPool> {
    let options = MySqlConnectOptions::new()
        .host(host)
        .username(user)
        .password(password);
    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

#[async_trait(?Send)]
impl SqlExecutor for PoolConnection<MySql> {
    async fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        let conn: &mut MySqlConnection = &mut *self;
        // MySQL refuses to prepare USE (and some SHOW forms), so bind-free
        // statements go over the text protocol.
        if params.is_empty() {
            let done = sqlx::raw_sql(sql).execute(conn).await?;
            return Ok(done.rows_affected());
        }
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.clone());
        }
        let done = query.execute(conn).await?;
        Ok(done.rows_affected())
    }

    async fn fetch_strings(&mut self, sql: &str) -> Result<Vec<String>> {
        let conn: &mut MySqlConnection = &mut *self;
        let rows = sqlx::raw_sql(sql).fetch_all(conn).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(Into::into))
            .collect()
    }
}
