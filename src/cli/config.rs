//! CLI configuration from environment variables

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::db::ConnectionOptions;
use crate::ingest::{ExtractTarget, IngestJob};
use crate::storage::CredentialSource;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8005;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_DATABASE: &str = "bd_api_employees";
pub const DEFAULT_TABLE: &str = "employees";
pub const DEFAULT_EXPORT_PATH: &str = "data.csv";
pub const DEFAULT_BUCKET: &str = "gcr-output-01";

/// CLI configuration parsed from environment variables
#[derive(Clone)]
pub struct IngestConfig {
    // MySQL
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// `None` when `DB_NAME` is set to an empty string
    pub database: Option<String>,
    /// `None` when `DB_TABLE` is set to an empty string
    pub table: Option<String>,

    // Output
    pub export_path: PathBuf,

    // S3
    pub bucket_name: String,
    pub s3_region: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,

    // Behaviour
    pub log_catalog: bool,
    pub strict_upload: bool,
}

impl std::fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("table", &self.table)
            .field("export_path", &self.export_path)
            .field("bucket_name", &self.bucket_name)
            .field("s3_region", &self.s3_region)
            .field("log_catalog", &self.log_catalog)
            .field("strict_upload", &self.strict_upload)
            .finish_non_exhaustive()
    }
}

impl IngestConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.trim().parse().unwrap_or(false))
                .unwrap_or(false)
        };

        let port = match non_empty("DB_PORT") {
            Some(port) => port.parse::<u16>().context("DB_PORT must be a number")?,
            None => DEFAULT_PORT,
        };

        let s3_access_key = non_empty("S3_ACCESS_KEY");
        let s3_secret_key = non_empty("S3_SECRET_KEY");
        if s3_access_key.is_some() != s3_secret_key.is_some() {
            anyhow::bail!("S3_ACCESS_KEY and S3_SECRET_KEY must be set together");
        }

        Ok(Self {
            host: non_empty("DB_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            user: non_empty("DB_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            password: lookup("DB_PASSWORD").context("DB_PASSWORD is required")?,

            // Unset falls back to the default; set-but-empty means "none"
            database: match lookup("DB_NAME") {
                None => Some(DEFAULT_DATABASE.to_string()),
                Some(_) => non_empty("DB_NAME"),
            },
            table: match lookup("DB_TABLE") {
                None => Some(DEFAULT_TABLE.to_string()),
                Some(_) => non_empty("DB_TABLE"),
            },

            export_path: non_empty("EXPORT_PATH")
                .unwrap_or_else(|| DEFAULT_EXPORT_PATH.to_string())
                .into(),

            bucket_name: non_empty("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            s3_region: non_empty("S3_REGION"),
            s3_access_key,
            s3_secret_key,

            log_catalog: flag("LOG_CATALOG"),
            strict_upload: flag("STRICT_UPLOAD"),
        })
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
        }
    }

    pub fn target(&self) -> ExtractTarget {
        ExtractTarget::from_parts(self.database.as_deref(), self.table.as_deref())
    }

    pub fn credential_source(&self) -> CredentialSource {
        match (&self.s3_access_key, &self.s3_secret_key) {
            (Some(access_key), Some(secret_key)) => CredentialSource::Static {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            },
            _ => CredentialSource::DefaultChain,
        }
    }

    /// Convert to the job description the engine runs
    pub fn job(&self) -> IngestJob {
        IngestJob {
            connection: self.connection_options(),
            target: self.target(),
            export_path: self.export_path.clone(),
            bucket: self.bucket_name.clone(),
            log_catalog: self.log_catalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(vars: &[(&str, &str)]) -> Result<IngestConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        IngestConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[("DB_PASSWORD", "utec")]).unwrap();

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8005);
        assert_eq!(config.user, "root");
        assert_eq!(config.password, "utec");
        assert_eq!(config.export_path, PathBuf::from("data.csv"));
        assert_eq!(config.bucket_name, "gcr-output-01");
        assert!(!config.log_catalog);
        assert!(!config.strict_upload);
        assert_eq!(config.credential_source(), CredentialSource::DefaultChain);
        assert_eq!(
            config.target(),
            ExtractTarget::Table {
                database: "bd_api_employees".to_string(),
                table: "employees".to_string(),
            }
        );
    }

    #[test]
    fn test_password_is_required() {
        let err = parse(&[]).unwrap_err();
        assert!(err.to_string().contains("DB_PASSWORD"));
    }

    #[test]
    fn test_bad_port() {
        let err = parse(&[("DB_PASSWORD", "x"), ("DB_PORT", "abc")]).unwrap_err();
        assert!(err.to_string().contains("DB_PORT"));
    }

    #[test]
    fn test_empty_table_selects_whole_database() {
        let config = parse(&[("DB_PASSWORD", "x"), ("DB_NAME", "shop"), ("DB_TABLE", "")]).unwrap();
        assert_eq!(config.target(), ExtractTarget::Database("shop".to_string()));

        let config = parse(&[("DB_PASSWORD", "x"), ("DB_NAME", ""), ("DB_TABLE", "")]).unwrap();
        assert_eq!(config.target(), ExtractTarget::Scan);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3306"),
            ("DB_USER", "etl"),
            ("DB_PASSWORD", "x"),
            ("EXPORT_PATH", "/tmp/out/employees.csv"),
            ("S3_BUCKET", "exports"),
            ("S3_REGION", "eu-west-1"),
            ("S3_ACCESS_KEY", "AKIA1234"),
            ("S3_SECRET_KEY", "secret"),
            ("LOG_CATALOG", "true"),
            ("STRICT_UPLOAD", "true"),
        ])
        .unwrap();

        let job = config.job();
        assert_eq!(job.connection.host, "db.internal");
        assert_eq!(job.connection.port, 3306);
        assert_eq!(job.connection.user, "etl");
        assert_eq!(job.export_path, PathBuf::from("/tmp/out/employees.csv"));
        assert_eq!(job.bucket, "exports");
        assert!(job.log_catalog);
        assert!(config.strict_upload);
        assert_eq!(config.s3_region.as_deref(), Some("eu-west-1"));
        assert!(matches!(
            config.credential_source(),
            CredentialSource::Static { ref access_key, .. } if access_key == "AKIA1234"
        ));
    }

    #[test]
    fn test_half_static_credentials_rejected() {
        let err = parse(&[("DB_PASSWORD", "x"), ("S3_ACCESS_KEY", "AKIA")]).unwrap_err();
        assert!(err.to_string().contains("S3_SECRET_KEY"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = parse(&[
            ("DB_PASSWORD", "hunter2"),
            ("S3_ACCESS_KEY", "AKIA1234"),
            ("S3_SECRET_KEY", "topsecret"),
        ])
        .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("topsecret"));
    }
}
