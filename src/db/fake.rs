//! In-memory `SqlExecutor` for tests. Interprets the statement text the
//! pipeline actually generates (SHOW/CREATE/USE/INSERT and transaction
//! verbs) against hash-map state, so reconcile and insert logic can be
//! exercised end to end without a MySQL server.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{SqlExecutor, SqlParam};

#[derive(Debug, Default)]
pub(crate) struct FakeDb {
    pub databases: HashSet<String>,
    /// table name -> column names in definition order (including `id`).
    pub tables: HashMap<String, Vec<String>>,
    pub active_database: Option<String>,
    /// Every statement received, in order (execute and fetch alike).
    pub statements: Vec<String>,
    /// Bound parameters of each INSERT, in execution order.
    pub inserts: Vec<Vec<SqlParam>>,
    pub in_transaction: bool,
    pub committed: bool,
    pub rolled_back: bool,
    /// Fail the Nth INSERT (zero-based) with a synthetic error.
    pub fail_on_insert: Option<usize>,
    /// Fail transaction-control statements with a synthetic error.
    pub fail_on_begin: bool,
    pub fail_on_commit: bool,
}

impl FakeDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unquote_ident(raw: &str) -> String {
    raw.trim().trim_matches('`').replace("``", "`")
}

fn unquote_literal(raw: &str) -> String {
    raw.trim().trim_matches('\'').replace("''", "'")
}

/// Pull the identifier and the parenthesized column definitions out of a
/// CREATE TABLE statement.
fn parse_create_table(sql: &str) -> Result<(String, Vec<String>)> {
    let rest = sql
        .strip_prefix("CREATE TABLE IF NOT EXISTS ")
        .ok_or_else(|| anyhow::anyhow!("unexpected CREATE TABLE shape: {sql}"))?;
    let open = rest
        .find('(')
        .ok_or_else(|| anyhow::anyhow!("CREATE TABLE without column list: {sql}"))?;
    let close = rest
        .rfind(')')
        .ok_or_else(|| anyhow::anyhow!("CREATE TABLE without closing paren: {sql}"))?;

    let table = unquote_ident(&rest[..open]);
    let columns = rest[open + 1..close]
        .split(", ")
        .filter_map(|def| def.split_whitespace().next())
        .map(unquote_ident)
        .collect();
    Ok((table, columns))
}

#[async_trait(?Send)]
impl SqlExecutor for FakeDb {
    async fn execute(&mut self, sql: &str, params: &[SqlParam]) -> Result<u64> {
        self.statements.push(sql.to_string());

        if let Some(rest) = sql.strip_prefix("CREATE DATABASE IF NOT EXISTS ") {
            self.databases.insert(unquote_ident(rest));
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("USE ") {
            let database = unquote_ident(rest);
            if !self.databases.contains(&database) {
                bail!("unknown database `{database}`");
            }
            self.active_database = Some(database);
            return Ok(0);
        }
        if sql.starts_with("CREATE TABLE IF NOT EXISTS ") {
            let (table, columns) = parse_create_table(sql)?;
            self.tables.entry(table).or_insert(columns);
            return Ok(0);
        }
        if sql == "START TRANSACTION" {
            if self.fail_on_begin {
                bail!("synthetic begin failure");
            }
            self.in_transaction = true;
            return Ok(0);
        }
        if sql == "COMMIT" {
            if self.fail_on_commit {
                bail!("synthetic commit failure");
            }
            self.in_transaction = false;
            self.committed = true;
            return Ok(0);
        }
        if sql == "ROLLBACK" {
            self.in_transaction = false;
            self.rolled_back = true;
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            if self.fail_on_insert == Some(self.inserts.len()) {
                bail!("synthetic insert failure");
            }
            let table = unquote_ident(rest.split(" (").next().unwrap_or_default());
            if self.active_database.is_none() {
                bail!("INSERT with no active database");
            }
            if !self.tables.contains_key(&table) {
                bail!("unknown table `{table}`");
            }
            self.inserts.push(params.to_vec());
            return Ok(1);
        }

        bail!("unrecognized statement: {sql}")
    }

    async fn fetch_strings(&mut self, sql: &str) -> Result<Vec<String>> {
        self.statements.push(sql.to_string());

        if let Some(rest) = sql.strip_prefix("SHOW DATABASES LIKE ") {
            let database = unquote_literal(rest);
            return Ok(if self.databases.contains(&database) {
                vec![database]
            } else {
                Vec::new()
            });
        }
        if let Some(rest) = sql.strip_prefix("SHOW TABLES LIKE ") {
            if self.active_database.is_none() {
                bail!("SHOW TABLES with no active database");
            }
            let table = unquote_literal(rest);
            return Ok(if self.tables.contains_key(&table) {
                vec![table]
            } else {
                Vec::new()
            });
        }
        if let Some(rest) = sql.strip_prefix("SHOW COLUMNS FROM ") {
            let table = unquote_ident(rest);
            return match self.tables.get(&table) {
                Some(columns) => Ok(columns.clone()),
                None => bail!("unknown table `{table}`"),
            };
        }

        bail!("unrecognized query: {sql}")
    }
}
