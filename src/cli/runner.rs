//! CLI runner - one ingestion run from environment configuration

use anyhow::{Context, Result};
use std::time::Instant;

use crate::db::MySqlConnector;
use crate::ingest::{IngestEngine, Outcome};
use crate::storage::S3Store;

use super::config::IngestConfig;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: i32 = 1;

/// Run one ingestion and return the process exit code.
///
/// Errors are configuration errors only; pipeline failures are reported
/// through the exit code.
pub async fn run() -> Result<i32> {
    let start_time = Instant::now();

    let config = IngestConfig::from_env()
        .context("Error parsing configuration from environment")?;

    tracing::info!("===========================================");
    tracing::info!("MySQL -> CSV -> S3 ingestion");
    tracing::info!("===========================================");
    tracing::info!("Source: {}@{}:{}", config.user, config.host, config.port);
    tracing::info!("Target: {}", config.target());
    tracing::info!("Export file: {}", config.export_path.display());
    tracing::info!("Bucket: {}", config.bucket_name);
    if config.strict_upload {
        tracing::info!("Strict upload: upload failures fail the run");
    }

    let store = S3Store::new(config.s3_region.clone(), config.credential_source()).await;
    let engine = IngestEngine::new(config.job(), MySqlConnector, store);

    let report = engine.run().await;

    match &report.outcome {
        Outcome::Completed => tracing::info!("Ingestion completed in {:.2?}", start_time.elapsed()),
        Outcome::PartialUpload(_) => tracing::warn!(
            "Ingestion finished with upload error in {:.2?}",
            start_time.elapsed()
        ),
        Outcome::Aborted(e) => tracing::error!("Ingestion aborted: {}", e),
    }
    tracing::info!("{}", report.to_json());

    Ok(report.exit_code(config.strict_upload))
}
