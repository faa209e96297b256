//! Ingesta: MySQL table → CSV file → S3 bucket
//!
//! # Flow
//!
//! 1. Connect to MySQL (`DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`).
//! 2. Read rows:
//!    - `DB_NAME` + `DB_TABLE`: that table.
//!    - `DB_NAME` only (`DB_TABLE=""`): every non-empty table of the database,
//!      concatenated in catalog order.
//!    - neither: the first non-empty table of any non-system database.
//! 3. Write them to `EXPORT_PATH` (default `data.csv`), header from the first row.
//! 4. Upload the file to `S3_BUCKET` (default `gcr-output-01`), keyed by its file name.
//!
//! The database connection is closed on every path once it was opened.
//!
//! # Exit codes
//!
//! | code | meaning |
//! |------|---------|
//! | 0 | completed (or upload failed without `STRICT_UPLOAD`) |
//! | 1 | bad configuration |
//! | 2 | cannot connect |
//! | 3 | query failed or no rows |
//! | 4 | cannot write the CSV |
//! | 5 | upload failed with `STRICT_UPLOAD=true` |

mod cli;
mod db;
mod error;
mod ingest;
mod storage;

fn main() {
    // RUST_LOG refines the default info level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {}", e);
            std::process::exit(cli::EXIT_CONFIG);
        }
    };

    let code = match rt.block_on(cli::run()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Ingestion failed: {:#}", e);
            cli::EXIT_CONFIG
        }
    };

    // Drop the runtime before exiting so pending client tasks shut down
    drop(rt);
    std::process::exit(code);
}
