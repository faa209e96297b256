//! Local CSV export and S3 upload

pub mod csv_file;
pub mod s3;

pub use csv_file::{write_delimited, WriteSummary};
pub use s3::{CredentialSource, ObjectStore, S3Store, UploadReceipt};
