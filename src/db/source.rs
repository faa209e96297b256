//! Traits between the pipeline and the database client

use async_trait::async_trait;

use crate::error::{ConnectError, QueryError};

use super::types::{ConnectionOptions, RowSet};

/// Databases that hold server metadata rather than user data.
pub const SYSTEM_DATABASES: [&str; 4] =
    ["information_schema", "performance_schema", "mysql", "sys"];

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES
        .iter()
        .any(|system| system.eq_ignore_ascii_case(name))
}

/// Opens sessions against the source database.
#[async_trait]
pub trait Connector: Send + Sync {
    type Source: RowSource;

    async fn connect(&self, options: &ConnectionOptions) -> Result<Self::Source, ConnectError>;
}

/// An open session that can list the catalog and read whole tables.
#[async_trait]
pub trait RowSource: Send {
    async fn list_databases(&mut self) -> Result<Vec<String>, QueryError>;

    async fn list_tables(&mut self, database: &str) -> Result<Vec<String>, QueryError>;

    async fn count_rows(&mut self, database: &str, table: &str) -> Result<u64, QueryError>;

    async fn select_all(&mut self, database: &str, table: &str) -> Result<RowSet, QueryError>;

    /// Ends the session. Consumes the source so it can only happen once.
    async fn close(self);
}

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `database`.`table`, both parts quoted.
pub fn qualified_table(database: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(database), quote_identifier(table))
}
