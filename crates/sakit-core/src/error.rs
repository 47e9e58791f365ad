//! Error types for sakit-core

use crate::credentials::CredentialsError;
use thiserror::Error;

/// Result type alias using sakit-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification shared by every sakit error type
///
/// The CLI switches on this to choose a headline and remediation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The named resource (secret, version, bucket, file) does not exist
    NotFound,
    /// The identity lacks the required IAM role
    PermissionDenied,
    /// No usable credentials
    Unauthenticated,
    /// Caller-supplied input was rejected
    InvalidInput,
    /// Network failure or timeout
    Transport,
    /// Any other non-success API response
    Api,
    /// Configuration could not be loaded
    Config,
    /// Local filesystem failure
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidInput => "invalid input",
            Self::Transport => "network error",
            Self::Api => "API error",
            Self::Config => "configuration error",
            Self::Io => "I/O error",
        };
        f.write_str(label)
    }
}

/// Core error types for sakit
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing required setting
    #[error("Missing required setting: {field}")]
    MissingField { field: String },

    /// Credential resolution failed
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigNotFound { .. }
            | Self::InvalidConfig { .. }
            | Self::YamlParse(_)
            | Self::JsonParse(_)
            | Self::MissingField { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Credentials(e) => e.kind(),
            Self::HttpClient { .. } => ErrorKind::Transport,
        }
    }

    /// Remediation hints for display
    pub fn hints(&self) -> Vec<String> {
        match self {
            Self::ConfigNotFound { path } => vec![format!(
                "Create {} or omit --config to use defaults",
                path
            )],
            Self::MissingField { .. } => vec![
                "Set `project` in sakit.yaml".to_string(),
                "Or export SAKIT_PROJECT=<project-id>".to_string(),
            ],
            Self::Credentials(e) => e.hints(),
            _ => Vec::new(),
        }
    }

    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an HTTP client error
    pub fn http_client(message: impl Into<String>) -> Self {
        Self::HttpClient {
            message: message.into(),
        }
    }
}
