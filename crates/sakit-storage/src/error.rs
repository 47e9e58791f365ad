//! Error types for object uploads

use sakit_core::{CredentialsError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors raised by Cloud Storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Source file does not exist
    #[error("File not found: {}", path.display())]
    LocalFileMissing { path: PathBuf },

    /// Source file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    LocalFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bucket or object name rejected before sending
    #[error("Invalid {field}: {reason}")]
    InvalidName { field: &'static str, reason: String },

    /// Bucket does not exist
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// Identity lacks write access to the bucket
    #[error("Permission denied uploading to gs://{bucket}: {message}")]
    PermissionDenied { bucket: String, message: String },

    /// Identity may not list the project's buckets
    #[error("Permission denied listing buckets in project '{project}': {message}")]
    ListDenied { project: String, message: String },

    /// Request carried no valid credentials
    #[error("Request was not authenticated: {message}")]
    Unauthenticated { message: String },

    /// Any other non-success response
    #[error("Cloud Storage returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Network failure or timeout
    #[error("Failed to reach Cloud Storage: {message}")]
    Transport { message: String },

    /// Response could not be decoded
    #[error("Unexpected Cloud Storage response: {message}")]
    InvalidResponse { message: String },

    /// Token could not be obtained
    #[error(transparent)]
    Auth(#[from] CredentialsError),

    /// Client construction failed
    #[error(transparent)]
    Core(#[from] sakit_core::Error),
}

impl StorageError {
    /// Create an invalid name error
    pub fn invalid_name(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            field,
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LocalFileMissing { .. } | Self::BucketNotFound { .. } => ErrorKind::NotFound,
            Self::LocalFileRead { .. } => ErrorKind::Io,
            Self::InvalidName { .. } => ErrorKind::InvalidInput,
            Self::PermissionDenied { .. } | Self::ListDenied { .. } => {
                ErrorKind::PermissionDenied
            }
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::Api { .. } | Self::InvalidResponse { .. } => ErrorKind::Api,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Auth(e) => e.kind(),
            Self::Core(e) => e.kind(),
        }
    }

    /// Remediation hints for display
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::BucketNotFound { bucket } => vec![format!("Make sure bucket '{}' exists", bucket)],
            Self::PermissionDenied { .. } => vec![
                "Possible causes:".to_string(),
                "  • Service Account doesn't have objectCreator role on this bucket".to_string(),
                "  • GOOGLE_APPLICATION_CREDENTIALS not set correctly".to_string(),
                "  • Bucket doesn't exist".to_string(),
            ],
            Self::ListDenied { project, .. } => vec![
                "Listing buckets needs storage.buckets.list on the project".to_string(),
                "The Storage Object Creator role does not include it; grant e.g.:".to_string(),
                format!(
                    "  gcloud projects add-iam-policy-binding {} --member='serviceAccount:YOUR_SA@{}.iam.gserviceaccount.com' --role='roles/storage.admin'",
                    project, project
                ),
            ],
            Self::Unauthenticated { .. } => vec![
                "To set credentials:".to_string(),
                "  export GOOGLE_APPLICATION_CREDENTIALS=~/demo-uploader-key.json".to_string(),
            ],
            Self::Transport { .. } => {
                vec!["Check network connectivity to storage.googleapis.com".to_string()]
            }
            Self::Auth(e) => e.hints(),
            Self::Core(e) => e.hints(),
            _ => Vec::new(),
        }
    }
}
