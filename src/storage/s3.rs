//! S3 upload of the exported file

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use serde::Serialize;

use crate::error::UploadError;

/// Where the S3 client gets its credentials from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Environment, profile files, instance metadata... whatever the SDK finds.
    DefaultChain,
    Static {
        access_key: String,
        secret_key: String,
    },
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::DefaultChain => f.write_str("DefaultChain"),
            CredentialSource::Static { access_key, .. } => f
                .debug_struct("Static")
                .field("access_key", &redact(access_key))
                .finish_non_exhaustive(),
        }
    }
}

fn redact(key: &str) -> String {
    format!("{}...", key.chars().take(4).collect::<String>())
}

/// Proof that an object landed in the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReceipt {
    pub bucket: String,
    pub key: String,
    pub size_bytes: u64,
    pub e_tag: Option<String>,
}

/// A bucket store that accepts whole files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `path` into `bucket`, keyed by the file's base name.
    async fn upload(&self, path: &Path, bucket: &str) -> Result<UploadReceipt, UploadError>;
}

/// Object key for a local file: its base name, without any directory.
pub fn object_key(path: &Path) -> Result<String, UploadError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| UploadError::InvalidPath(path.to_path_buf()))
}

/// S3 implementation of [`ObjectStore`]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub async fn new(region: Option<String>, credentials: CredentialSource) -> Self {
        tracing::info!(
            "Creating S3 client: region={}, credentials={:?}",
            region.as_deref().unwrap_or("<default>"),
            credentials
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = region {
            loader = loader.region(Region::new(region.trim().to_string()));
        }

        if let CredentialSource::Static {
            access_key,
            secret_key,
        } = credentials
        {
            // Trim whitespace from credentials (common copy-paste issue)
            let creds =
                Credentials::new(access_key.trim(), secret_key.trim(), None, None, "static");
            loader = loader.credentials_provider(creds);
        }

        let config = loader.load().await;

        Self {
            client: aws_sdk_s3::Client::new(&config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, path: &Path, bucket: &str) -> Result<UploadReceipt, UploadError> {
        let key = object_key(path)?;

        let size_bytes = path
            .metadata()
            .map_err(|e| UploadError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .len();

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| UploadError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        tracing::info!("Uploading {} to s3://{}/{}", path.display(), bucket, key);

        let output = self
            .client
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("S3 upload error details: {:?}", e);
                UploadError::Put {
                    bucket: bucket.to_string(),
                    key: key.clone(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        tracing::info!(
            "File {} successfully uploaded to S3 bucket {}",
            path.display(),
            bucket
        );

        Ok(UploadReceipt {
            bucket: bucket.to_string(),
            key,
            size_bytes,
            e_tag: output.e_tag().map(str::to_string),
        })
    }
}
