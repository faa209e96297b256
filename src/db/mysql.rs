//! MySQL connection and queries

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use mysql_async::consts::ColumnType;
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder};

use crate::error::{ConnectError, QueryError};

use super::source::{qualified_table, quote_identifier, Connector, RowSource};
use super::types::{ConnectionOptions, Row, RowSet, Value};

/// Opens [`MySqlSource`] sessions over TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

#[async_trait]
impl Connector for MySqlConnector {
    type Source = MySqlSource;

    async fn connect(&self, options: &ConnectionOptions) -> Result<MySqlSource, ConnectError> {
        let opts = OptsBuilder::default()
            .ip_or_hostname(options.host.clone())
            .tcp_port(options.port)
            .user(Some(options.user.clone()))
            .pass(Some(options.password.clone()));

        let conn = Conn::new(opts).await.map_err(|e| ConnectError {
            host: options.host.clone(),
            port: options.port,
            message: e.to_string(),
        })?;

        tracing::info!(
            "Connected to MySQL at {}:{} as {}",
            options.host,
            options.port,
            options.user
        );

        Ok(MySqlSource { conn })
    }
}

/// An open MySQL session.
///
/// Rows come back keyed by column name, in result-set order.
pub struct MySqlSource {
    conn: Conn,
}

#[async_trait]
impl RowSource for MySqlSource {
    async fn list_databases(&mut self) -> Result<Vec<String>, QueryError> {
        let statement = "SHOW DATABASES";
        self.conn
            .query::<String, _>(statement)
            .await
            .map_err(|e| QueryError::new(statement, e))
    }

    async fn list_tables(&mut self, database: &str) -> Result<Vec<String>, QueryError> {
        let statement = format!("SHOW TABLES FROM {}", quote_identifier(database));
        self.conn
            .query::<String, _>(statement.as_str())
            .await
            .map_err(|e| QueryError::new(statement.as_str(), e))
    }

    async fn count_rows(&mut self, database: &str, table: &str) -> Result<u64, QueryError> {
        let statement = format!("SELECT COUNT(*) FROM {}", qualified_table(database, table));
        let count = self
            .conn
            .query_first::<u64, _>(statement.as_str())
            .await
            .map_err(|e| QueryError::new(statement.as_str(), e))?;
        Ok(count.unwrap_or(0))
    }

    async fn select_all(&mut self, database: &str, table: &str) -> Result<RowSet, QueryError> {
        let statement = format!("SELECT * FROM {}", qualified_table(database, table));

        // Binary protocol so numbers and dates arrive typed
        let rows: Vec<mysql_async::Row> = self
            .conn
            .exec(statement.as_str(), ())
            .await
            .map_err(|e| QueryError::new(statement.as_str(), e))?;

        Ok(rows.into_iter().map(convert_row).collect())
    }

    async fn close(self) {
        match self.conn.disconnect().await {
            Ok(()) => tracing::info!("Database connection closed"),
            Err(e) => tracing::warn!("Error closing database connection: {}", e),
        }
    }
}

fn convert_row(mut row: mysql_async::Row) -> Row {
    let columns: Vec<(String, ColumnType)> = row
        .columns_ref()
        .iter()
        .map(|c| (c.name_str().into_owned(), c.column_type()))
        .collect();

    let fields = columns
        .into_iter()
        .enumerate()
        .map(|(i, (name, column_type))| {
            let value = row
                .take::<mysql_async::Value, _>(i)
                .unwrap_or(mysql_async::Value::NULL);
            (name, convert_value(value, column_type))
        })
        .collect();

    Row::new(fields)
}

fn is_date_column(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    )
}

/// Convert a wire value into a [`Value`].
///
/// The column type decides between date and datetime: a DATETIME at midnight
/// is still a datetime.
fn convert_value(value: mysql_async::Value, column_type: ColumnType) -> Value {
    match value {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => Value::Text(s),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(n) => Value::Int(n),
        mysql_async::Value::UInt(n) => Value::UInt(n),
        mysql_async::Value::Float(f) => Value::Float(f),
        mysql_async::Value::Double(d) => Value::Double(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let is_date = is_date_column(column_type);
            let Some(date) = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) else {
                // Zero dates ('0000-00-00') have no calendar equivalent
                let date = format!("{:04}-{:02}-{:02}", year, month, day);
                return if is_date {
                    Value::Text(date)
                } else {
                    Value::Text(format!("{} {:02}:{:02}:{:02}", date, hour, min, sec))
                };
            };
            if is_date {
                Value::Date(date)
            } else {
                match NaiveTime::from_hms_micro_opt(hour as u32, min as u32, sec as u32, micro) {
                    Some(time) => Value::DateTime(date.and_time(time)),
                    None => Value::Null,
                }
            }
        }
        mysql_async::Value::Time(negative, days, hour, min, sec, micro) => {
            let hours = days * 24 + hour as u32;
            let sign = if negative { "-" } else { "" };
            if micro == 0 {
                Value::Time(format!("{}{:02}:{:02}:{:02}", sign, hours, min, sec))
            } else {
                Value::Time(format!(
                    "{}{:02}:{:02}:{:02}.{:06}",
                    sign, hours, min, sec, micro
                ))
            }
        }
    }
}
