//! Ingestion engine
//!
//! Runs connect → extract → write CSV → upload, in order, and always releases
//! the database session it opened before returning.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::db::catalog::log_catalog;
use crate::db::{ConnectionOptions, Connector, RowSource};
use crate::error::{ExtractError, IngestError, UploadError};
use crate::storage::{write_delimited, ObjectStore, UploadReceipt, WriteSummary};

use super::extractor::{extract, ExtractTarget};

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct IngestJob {
    pub connection: ConnectionOptions,
    pub target: ExtractTarget,
    pub export_path: PathBuf,
    pub bucket: String,
    /// Log the database catalog before extracting
    pub log_catalog: bool,
}

/// Where a run got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Connected,
    Extracted,
    Serialized,
    Uploaded,
    Done,
    Aborted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Connected => "connected",
            Stage::Extracted => "extracted",
            Stage::Serialized => "serialized",
            Stage::Uploaded => "uploaded",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    /// The CSV was written but could not be uploaded.
    PartialUpload(UploadError),
    Aborted(IngestError),
}

/// Result of [`IngestEngine::run`].
#[derive(Debug)]
pub struct RunReport {
    pub stage: Stage,
    pub outcome: Outcome,
    pub rows: usize,
    pub export: Option<WriteSummary>,
    pub receipt: Option<UploadReceipt>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            stage: Stage::Init,
            outcome: Outcome::Completed,
            rows: 0,
            export: None,
            receipt: None,
        }
    }

    fn advance(&mut self, stage: Stage) {
        tracing::info!("Stage {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn abort(mut self, error: IngestError) -> Self {
        self.advance(Stage::Aborted);
        self.outcome = Outcome::Aborted(error);
        self
    }

    #[cfg(test)]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Completed)
    }

    /// Process exit code. An upload failure only counts when `strict_upload` is set.
    pub fn exit_code(&self, strict_upload: bool) -> i32 {
        match &self.outcome {
            Outcome::Completed => 0,
            Outcome::PartialUpload(_) if strict_upload => 5,
            Outcome::PartialUpload(_) => 0,
            Outcome::Aborted(e) => e.exit_code(),
        }
    }

    /// One-line JSON status for log scrapers.
    pub fn to_json(&self) -> serde_json::Value {
        let (status, error_kind, error) = match &self.outcome {
            Outcome::Completed => ("completed", None, None),
            Outcome::PartialUpload(e) => ("partial", Some("upload"), Some(e.to_string())),
            Outcome::Aborted(e) => ("aborted", Some(e.kind()), Some(e.to_string())),
        };

        serde_json::json!({
            "status": status,
            "stage": self.stage,
            "rows": self.rows,
            "export": self.export,
            "upload": self.receipt,
            "error_kind": error_kind,
            "error": error,
        })
    }
}

/// Ingestion engine, generic over the database and the object store.
pub struct IngestEngine<C, S> {
    job: IngestJob,
    connector: C,
    store: S,
}

impl<C: Connector, S: ObjectStore> IngestEngine<C, S> {
    pub fn new(job: IngestJob, connector: C, store: S) -> Self {
        Self {
            job,
            connector,
            store,
        }
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();
        tracing::info!("Starting data ingestion process...");

        let mut source = match self.connector.connect(&self.job.connection).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Error connecting to MySQL: {}", e);
                tracing::error!("Failed to connect to MySQL. Exiting.");
                return report.abort(e.into());
            }
        };
        report.advance(Stage::Connected);

        let result = self.export(&mut source, &mut report).await;

        source.close().await;

        match result {
            Ok(()) => report,
            Err(e) => report.abort(e),
        }
    }

    async fn export(
        &self,
        source: &mut C::Source,
        report: &mut RunReport,
    ) -> Result<(), IngestError> {
        // A scan logs the catalog itself
        if self.job.log_catalog && self.job.target != ExtractTarget::Scan {
            log_catalog(&mut *source).await;
        }

        let rows = extract(&mut *source, &self.job.target)
            .await
            .map_err(ExtractError::from)?;

        if rows.is_empty() {
            tracing::error!("Ingestion failed: No data found in database");
            return Err(ExtractError::Empty {
                target: self.job.target.to_string(),
            }
            .into());
        }
        tracing::info!("Successfully retrieved {} rows from database", rows.len());
        report.rows = rows.len();
        report.advance(Stage::Extracted);

        let summary = write_delimited(&rows, &self.job.export_path).map_err(|e| {
            tracing::error!("Error saving data to CSV: {}", e);
            tracing::error!("Ingestion failed: Could not save data to CSV");
            e
        })?;
        report.export = Some(summary);
        report.advance(Stage::Serialized);

        match self.store.upload(&self.job.export_path, &self.job.bucket).await {
            Ok(receipt) => {
                report.receipt = Some(receipt);
                report.advance(Stage::Uploaded);
                tracing::info!("Ingestion completed successfully");
            }
            Err(e) => {
                tracing::error!("Error uploading to S3: {}", e);
                tracing::warn!(
                    "Ingestion completed with S3 upload error; local export kept at {}",
                    self.job.export_path.display()
                );
                report.outcome = Outcome::PartialUpload(e);
            }
        }

        report.advance(Stage::Done);
        Ok(())
    }
}
