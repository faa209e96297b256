//! Reads rows for the configured database and table

use std::fmt;

use crate::db::catalog::log_catalog;
use crate::db::source::is_system_database;
use crate::db::{RowSet, RowSource};
use crate::error::QueryError;

/// What to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractTarget {
    /// One exact table.
    Table { database: String, table: String },
    /// Every non-empty table of a database, concatenated.
    Database(String),
    /// The first non-empty table of any non-system database.
    Scan,
}

impl ExtractTarget {
    /// Picks the case from an optional database and table.
    ///
    /// A table without a database is treated as a full scan, since there is no
    /// database to resolve it in.
    pub fn from_parts(database: Option<&str>, table: Option<&str>) -> Self {
        match (database, table) {
            (Some(database), Some(table)) => ExtractTarget::Table {
                database: database.to_string(),
                table: table.to_string(),
            },
            (Some(database), None) => ExtractTarget::Database(database.to_string()),
            (None, _) => ExtractTarget::Scan,
        }
    }
}

impl fmt::Display for ExtractTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractTarget::Table { database, table } => write!(f, "{}.{}", database, table),
            ExtractTarget::Database(database) => write!(f, "database '{}'", database),
            ExtractTarget::Scan => f.write_str("any database"),
        }
    }
}

/// Reads the rows for `target`.
///
/// Returns an empty set when the target simply has no rows; a failing query is
/// an error so callers can tell the two apart.
pub async fn extract<S: RowSource>(
    source: &mut S,
    target: &ExtractTarget,
) -> Result<RowSet, QueryError> {
    let result = match target {
        ExtractTarget::Table { database, table } => source.select_all(database, table).await,
        ExtractTarget::Database(database) => extract_database(source, database).await,
        ExtractTarget::Scan => scan_first_non_empty(source).await,
    };

    if let Err(e) = &result {
        tracing::error!("Error reading data from MySQL: {}", e);
    }
    result
}

async fn extract_database<S: RowSource>(
    source: &mut S,
    database: &str,
) -> Result<RowSet, QueryError> {
    let tables = source.list_tables(database).await?;
    if tables.is_empty() {
        tracing::warn!("No tables found in database '{}'", database);
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for table in &tables {
        let count = source.count_rows(database, table).await?;
        if count > 0 {
            tracing::info!(
                "Reading {} rows from table '{}' in database '{}'",
                count,
                table,
                database
            );
            rows.extend(source.select_all(database, table).await?);
        }
    }

    Ok(rows)
}

async fn scan_first_non_empty<S: RowSource>(
    source: &mut S,
) -> Result<RowSet, QueryError> {
    tracing::info!("No specific database/table specified. Scanning for data...");
    log_catalog(source).await;

    for database in source.list_databases().await? {
        if is_system_database(&database) {
            continue;
        }
        for table in source.list_tables(&database).await? {
            let count = source.count_rows(&database, &table).await?;
            if count > 0 {
                tracing::info!("Found data in {}.{} ({} rows)", database, table, count);
                return source.select_all(&database, &table).await;
            }
        }
    }

    tracing::warn!("No data found in any table");
    Ok(Vec::new())
}
