//! Error types for secret access

use sakit_core::{CredentialsError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for secret operations
pub type Result<T> = std::result::Result<T, SecretError>;

/// Errors raised while resolving secrets
#[derive(Error, Debug)]
pub enum SecretError {
    /// Secret reference could not be parsed
    #[error("Invalid secret reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// Secret or version does not exist
    #[error("Secret '{secret}' version '{version}' not found in project '{project}'")]
    NotFound {
        project: String,
        secret: String,
        version: String,
    },

    /// Secret does not exist (listing its versions)
    #[error("Secret '{secret}' not found in project '{project}'")]
    SecretNotFound { project: String, secret: String },

    /// Caller lacks access to the secret
    #[error("Permission denied accessing {resource}: {message}")]
    PermissionDenied {
        project: String,
        resource: String,
        message: String,
    },

    /// Request carried no valid credentials
    #[error("Request was not authenticated: {message}")]
    Unauthenticated { message: String },

    /// Any other non-success response
    #[error("Secret Manager returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Network failure or timeout
    #[error("Failed to reach Secret Manager: {message}")]
    Transport { message: String },

    /// Response payload could not be decoded
    #[error("Invalid secret payload: {message}")]
    InvalidPayload { message: String },

    /// Token could not be obtained
    #[error(transparent)]
    Auth(#[from] CredentialsError),

    /// Client construction failed
    #[error(transparent)]
    Core(#[from] sakit_core::Error),

    /// Mounted secret file is missing
    #[error("Secret file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Mounted secret file could not be read
    #[error("Failed to read secret file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Mounted secret file is not valid JSON
    #[error("Invalid JSON in {}: {source}", path.display())]
    FileParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Filename escapes the secrets directory
    #[error("Secret file '{name}' resolves outside {}", dir.display())]
    PathTraversal { name: String, dir: PathBuf },

    /// Secret content failed validation
    #[error("Invalid secret value in {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl SecretError {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::SecretNotFound { .. } | Self::FileNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::Api { .. } => ErrorKind::Api,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::InvalidReference { .. }
            | Self::InvalidPayload { .. }
            | Self::FileParse { .. }
            | Self::PathTraversal { .. }
            | Self::InvalidValue { .. } => ErrorKind::InvalidInput,
            Self::FileRead { .. } => ErrorKind::Io,
            Self::Auth(e) => e.kind(),
            Self::Core(e) => e.kind(),
        }
    }

    /// Remediation hints for display
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::NotFound { project, .. } | Self::SecretNotFound { project, .. } => vec![format!(
                "Verify the secret exists: gcloud secrets list --project={}",
                project
            )],
            Self::PermissionDenied { resource, .. } if !resource.contains("/secrets/") => vec![
                "You may have access to specific secrets but not list all secrets".to_string(),
                "Try accessing a specific secret by name instead".to_string(),
            ],
            Self::PermissionDenied { project, resource, .. } => {
                let secret = resource
                    .split('/')
                    .skip_while(|part| *part != "secrets")
                    .nth(1)
                    .unwrap_or("SECRET_NAME");
                vec![
                    "Grant access with:".to_string(),
                    format!("  gcloud secrets add-iam-policy-binding {} \\", secret),
                    format!("    --project={} \\", project),
                    format!(
                        "    --member='serviceAccount:YOUR_SA@{}.iam.gserviceaccount.com' \\",
                        project
                    ),
                    "    --role='roles/secretmanager.secretAccessor'".to_string(),
                ]
            }
            Self::Unauthenticated { .. } => vec![
                "Check that GOOGLE_APPLICATION_CREDENTIALS points to a valid key".to_string(),
                "Or run `gcloud auth application-default login`".to_string(),
            ],
            Self::Transport { .. } => {
                vec!["Check network connectivity to secretmanager.googleapis.com".to_string()]
            }
            Self::FileNotFound { .. } => vec![
                "Verify the CSI driver volume is mounted correctly".to_string(),
                "Check the SecretProviderClass configuration".to_string(),
                "Inspect pod events: kubectl describe pod <pod-name>".to_string(),
            ],
            Self::FileParse { .. } => {
                vec!["The mounted file must contain a JSON document".to_string()]
            }
            Self::Auth(e) => e.hints(),
            Self::Core(e) => e.hints(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_hint_names_secret() {
        let err = SecretError::PermissionDenied {
            project: "my-project-dev".to_string(),
            resource: "projects/my-project-dev/secrets/demo-app-api-key/versions/latest"
                .to_string(),
            message: "denied".to_string(),
        };

        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        let hints = err.hints().join("\n");
        assert!(hints.contains("add-iam-policy-binding demo-app-api-key"));
        assert!(hints.contains("roles/secretmanager.secretAccessor"));
    }

    #[test]
    fn test_list_permission_hint() {
        let err = SecretError::PermissionDenied {
            project: "p".to_string(),
            resource: "projects/p".to_string(),
            message: "denied".to_string(),
        };
        assert!(err.hints()[0].contains("not list all secrets"));
    }

    #[test]
    fn test_not_found_message() {
        let err = SecretError::NotFound {
            project: "p".to_string(),
            secret: "db".to_string(),
            version: "3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Secret 'db' version '3' not found in project 'p'"
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_auth_kind_passes_through() {
        let err: SecretError = CredentialsError::token("expired").into();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    }
}
