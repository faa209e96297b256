//! Error kinds for each pipeline step

use std::path::PathBuf;

use thiserror::Error;

/// The database session could not be established.
#[derive(Debug, Error)]
#[error("cannot connect to MySQL at {host}:{port}: {message}")]
pub struct ConnectError {
    pub host: String,
    pub port: u16,
    pub message: String,
}

/// A catalog or row query failed.
#[derive(Debug, Error)]
#[error("query `{statement}` failed: {message}")]
pub struct QueryError {
    pub statement: String,
    pub message: String,
}

impl QueryError {
    pub fn new(statement: impl Into<String>, message: impl ToString) -> Self {
        Self {
            statement: statement.into(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("no rows found for {target}")]
    Empty { target: String },
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("no rows to write")]
    EmptyInput,

    #[error("row {row} has column `{column}` which is not in the header")]
    UnexpectedColumn { row: usize, column: String },

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{} has no file name to use as object key", .0.display())]
    InvalidPath(PathBuf),

    #[error("cannot read {} for upload: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("upload to bucket '{bucket}' key '{key}' failed: {message}")]
    Put {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Failure that aborts a run, carrying the process exit code it maps to.
///
/// Upload failures never abort; they end the run as a partial upload.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

}

impl IngestError {
    pub fn exit_code(&self) -> i32 {
        match self {
            IngestError::Connect(_) => 2,
            IngestError::Extract(_) => 3,
            IngestError::Serialize(_) => 4,
        }
    }

    /// Short machine-friendly name, used in the run report.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Connect(_) => "connection",
            IngestError::Extract(ExtractError::Query(_)) => "query",
            IngestError::Extract(ExtractError::Empty { .. }) => "empty_data",
            IngestError::Serialize(_) => "serialization",
        }
    }
}
