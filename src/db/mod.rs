//! SQLite pool setup and schema bootstrap.
//!
//! The schema in `sql/schema.sql` is embedded at compile time and every
//! statement is `IF NOT EXISTS`, so applying it on each startup is safe.

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

pub const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

/// Open a connection pool for `dsn` with foreign keys enforced on every connection.
///
/// # Errors
/// Returns an error if the connection string is invalid or the database cannot be opened.
pub async fn connect(dsn: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(dsn)
        .with_context(|| format!("Invalid database connection string: {dsn}"))?
        .foreign_keys(true)
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Apply the embedded schema inside a single transaction.
///
/// # Errors
/// Returns an error if any statement fails; nothing is committed in that case.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin schema transaction")?;

    let statements = split_sql_statements(SCHEMA_SQL);
    for (index, statement) in statements.iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    tx.commit()
        .await
        .context("Failed to commit schema transaction")?;

    debug!("Applied {} schema statements", statements.len());

    Ok(())
}

/// Connect and bootstrap the schema.
///
/// # Errors
/// Returns an error if the pool cannot be created or the schema cannot be applied.
pub async fn init(dsn: &str) -> Result<SqlitePool> {
    let pool = connect(dsn).await?;
    apply_schema(&pool).await?;

    info!("Database ready");

    Ok(pool)
}

/// Splits a schema file into individual statements, dropping `--` comment lines.
/// Statements must end with `;` at the end of a line and must not nest semicolons.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}
