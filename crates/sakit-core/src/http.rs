//! Shared HTTP plumbing for the Google REST clients

use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Install the rustls crypto provider (required for rustls 0.23+)
///
/// Safe to call repeatedly; only the first call installs.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Build the HTTP client used by the API clients
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    install_crypto_provider();

    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sakit/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::http_client(format!("Failed to create HTTP client: {}", e)))
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Debug, Deserialize)]
pub struct GoogleApiError {
    pub error: GoogleApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleApiErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Extract a readable message from an error response body
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleApiError>(body) {
        Ok(api_error) if !api_error.error.message.is_empty() => api_error.error.message,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}
