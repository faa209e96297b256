//! In-memory doubles of the database and object store

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::{ConnectionOptions, Connector, Row, RowSet, RowSource, Value};
use crate::error::{ConnectError, QueryError, UploadError};
use crate::storage::s3::{object_key, ObjectStore, UploadReceipt};

type Tables = Vec<(String, RowSet)>;

/// Rows `{id, source}` numbered from 1, tagged with their table.
pub fn numbered_rows(table: &str, count: usize) -> RowSet {
    (1..=count)
        .map(|i| {
            Row::from_iter(vec![
                ("id", Value::Int(i as i64)),
                ("source", Value::from(table)),
            ])
        })
        .collect()
}

/// A catalog held in memory. Statements named in `failing_on` return errors.
///
/// Labels are `SHOW DATABASES`, `SHOW TABLES FROM <db>`, `COUNT <db>.<table>`
/// and `SELECT <db>.<table>`.
#[derive(Clone, Default)]
pub struct FakeSource {
    databases: Vec<(String, Tables)>,
    failing: Vec<String>,
    closed: Arc<AtomicUsize>,
    listings: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: &str) -> Self {
        self.database_mut(database);
        self
    }

    pub fn with_table(self, database: &str, table: &str, rows: usize) -> Self {
        self.with_rows(database, table, numbered_rows(table, rows))
    }

    pub fn with_rows(mut self, database: &str, table: &str, rows: RowSet) -> Self {
        self.database_mut(database).push((table.to_string(), rows));
        self
    }

    pub fn failing_on(mut self, label: &str) -> Self {
        self.failing.push(label.to_string());
        self
    }

    /// How many times `close` has run on this source or its clones.
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// How many times `SHOW DATABASES` was issued on this source or its clones.
    pub fn database_listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    fn database_mut(&mut self, database: &str) -> &mut Tables {
        let index = match self.databases.iter().position(|(name, _)| name == database) {
            Some(index) => index,
            None => {
                self.databases.push((database.to_string(), Vec::new()));
                self.databases.len() - 1
            }
        };
        &mut self.databases[index].1
    }

    fn check(&self, label: &str) -> Result<(), QueryError> {
        if self.failing.iter().any(|f| f == label) {
            Err(QueryError::new(label, "simulated failure"))
        } else {
            Ok(())
        }
    }

    fn tables(&self, database: &str) -> Option<&Tables> {
        self.databases
            .iter()
            .find(|(name, _)| name == database)
            .map(|(_, tables)| tables)
    }

    fn rows(&self, database: &str, table: &str, label: &str) -> Result<&RowSet, QueryError> {
        self.tables(database)
            .and_then(|tables| tables.iter().find(|(name, _)| name == table))
            .map(|(_, rows)| rows)
            .ok_or_else(|| {
                QueryError::new(label, format!("Table '{}.{}' doesn't exist", database, table))
            })
    }
}

#[async_trait]
impl RowSource for FakeSource {
    async fn list_databases(&mut self) -> Result<Vec<String>, QueryError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.check("SHOW DATABASES")?;
        Ok(self.databases.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn list_tables(&mut self, database: &str) -> Result<Vec<String>, QueryError> {
        let label = format!("SHOW TABLES FROM {}", database);
        self.check(&label)?;
        self.tables(database)
            .map(|tables| tables.iter().map(|(name, _)| name.clone()).collect())
            .ok_or_else(|| {
                QueryError::new(label.as_str(), format!("Unknown database '{}'", database))
            })
    }

    async fn count_rows(&mut self, database: &str, table: &str) -> Result<u64, QueryError> {
        let label = format!("COUNT {}.{}", database, table);
        self.check(&label)?;
        Ok(self.rows(database, table, &label)?.len() as u64)
    }

    async fn select_all(&mut self, database: &str, table: &str) -> Result<RowSet, QueryError> {
        let label = format!("SELECT {}.{}", database, table);
        self.check(&label)?;
        Ok(self.rows(database, table, &label)?.clone())
    }

    async fn close(self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out clones of one [`FakeSource`], or refuses to connect.
pub struct FakeConnector {
    pub source: FakeSource,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn new(source: FakeSource) -> Self {
        Self {
            source,
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        Self {
            source: FakeSource::new(),
            refuse: true,
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Source = FakeSource;

    async fn connect(&self, options: &ConnectionOptions) -> Result<FakeSource, ConnectError> {
        if self.refuse {
            return Err(ConnectError {
                host: options.host.clone(),
                port: options.port,
                message: "Connection refused".to_string(),
            });
        }
        Ok(self.source.clone())
    }
}

/// Records uploads instead of sending them.
#[derive(Clone, Default)]
pub struct FakeStore {
    pub fail: bool,
    uploads: Arc<Mutex<Vec<(PathBuf, String, String)>>>,
}

impl FakeStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(path, bucket, key)` of every upload attempt.
    pub fn uploads(&self) -> Vec<(PathBuf, String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(&self, path: &Path, bucket: &str) -> Result<UploadReceipt, UploadError> {
        let key = object_key(path)?;
        self.uploads
            .lock()
            .unwrap()
            .push((path.to_path_buf(), bucket.to_string(), key.clone()));

        if self.fail {
            return Err(UploadError::Put {
                bucket: bucket.to_string(),
                key,
                message: "NoSuchBucket".to_string(),
            });
        }

        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Ok(UploadReceipt {
            bucket: bucket.to_string(),
            key,
            size_bytes,
            e_tag: Some("\"fake\"".to_string()),
        })
    }
}
