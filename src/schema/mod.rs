//! Destination schema: column-name normalization, SQL identifier quoting,
//! DDL text, and the reconcile step that ensures database and table exist.

pub mod reconcile;

pub use reconcile::{reconcile, ReconciliationResult, SchemaState};

/// Every inferred column gets the same fixed-width textual type. No type
/// inference from cell contents.
pub const COLUMN_SQL_TYPE: &str = "VARCHAR(128)";

/// One destination column derived from a report header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: &'static str,
}

impl ColumnSpec {
    /// Derive the column set from header names, in header order.
    pub fn from_header(columns: &[String]) -> Vec<ColumnSpec> {
        columns
            .iter()
            .map(|raw| ColumnSpec {
                name: normalize_column(raw),
                sql_type: COLUMN_SQL_TYPE,
            })
            .collect()
    }
}

/// Normalize a raw header into a SQL identifier: lower-cased, each
/// whitespace character replaced with a hyphen. Runs of whitespace are not
/// collapsed. Idempotent, and applied identically at CREATE TABLE and
/// INSERT time so the names always match.
pub fn normalize_column(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

/// Backtick-quote an identifier, doubling any embedded backticks.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Single-quote a string literal, doubling any embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(database))
}

pub fn use_database_sql(database: &str) -> String {
    format!("USE {}", quote_ident(database))
}

pub fn show_databases_sql(database: &str) -> String {
    format!("SHOW DATABASES LIKE {}", quote_literal(database))
}

pub fn show_tables_sql(table: &str) -> String {
    format!("SHOW TABLES LIKE {}", quote_literal(table))
}

pub fn show_columns_sql(table: &str) -> String {
    format!("SHOW COLUMNS FROM {}", quote_ident(table))
}

/// CREATE TABLE with a synthetic auto-incrementing primary key plus one
/// fixed-width string column per inferred column.
pub fn create_table_sql(table: &str, columns: &[ColumnSpec]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|spec| format!("{} {}", quote_ident(&spec.name), spec.sql_type))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (id SERIAL PRIMARY KEY, {})",
        quote_ident(table),
        column_defs.join(", ")
    )
}
