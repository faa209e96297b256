//! Catalog listing for operator diagnostics

use crate::error::QueryError;

use super::source::{is_system_database, RowSource};
use super::types::DatabaseTables;

/// Lists tables of every non-system database, in catalog order.
pub async fn scan_catalog<S: RowSource>(
    source: &mut S,
) -> Result<Vec<DatabaseTables>, QueryError> {
    let databases = source.list_databases().await?;

    tracing::info!("Available databases:");
    for database in &databases {
        tracing::info!("  - {}", database);
    }

    let mut catalog = Vec::new();
    for database in databases.into_iter().filter(|d| !is_system_database(d)) {
        let tables = source.list_tables(&database).await?;
        catalog.push(DatabaseTables { database, tables });
    }

    Ok(catalog)
}

/// Logs the catalog. Never fails: errors are logged and swallowed.
pub async fn log_catalog<S: RowSource>(source: &mut S) {
    match scan_catalog(source).await {
        Ok(catalog) => {
            for entry in catalog.iter().filter(|e| !e.tables.is_empty()) {
                tracing::info!("Tables in database '{}':", entry.database);
                for table in &entry.tables {
                    tracing::info!("  - {}", table);
                }
            }
        }
        Err(e) => tracing::warn!("Error getting database information: {}", e),
    }
}
