//! Access token sources for the Google REST APIs

use crate::credentials::{CredentialSource, CredentialsError};
use async_trait::async_trait;
use gcp_auth::TokenProvider;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// OAuth scope covering Secret Manager and Cloud Storage
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Produces bearer tokens for outgoing API requests
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String, CredentialsError>;
}

/// Token source backed by `gcp_auth`
///
/// Uses the service account key file when one is configured, otherwise the
/// provider chain (metadata server, gcloud credentials). Tokens are cached
/// and refreshed by the provider.
#[derive(Clone)]
pub struct GoogleTokenSource {
    provider: Arc<dyn TokenProvider>,
    source: CredentialSource,
}

impl GoogleTokenSource {
    /// Build a token source for the given credentials
    pub async fn new(source: CredentialSource) -> Result<Self, CredentialsError> {
        let provider: Arc<dyn TokenProvider> = match &source {
            CredentialSource::KeyFile(path) => {
                let account = gcp_auth::CustomServiceAccount::from_file(path).map_err(|e| {
                    error!(error = %e, path = %path.display(), "Failed to load service account");
                    CredentialsError::token(format!(
                        "failed to load service account from {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Arc::new(account)
            }
            CredentialSource::ApplicationDefault => gcp_auth::provider().await.map_err(|e| {
                error!(error = %e, "Failed to initialize GCP auth");
                CredentialsError::token(format!("no application default credentials: {}", e))
            })?,
        };

        debug!(source = %source, "Initialized GCP token source");
        Ok(Self { provider, source })
    }

    /// Build a token source from `GOOGLE_APPLICATION_CREDENTIALS`
    pub async fn from_env() -> Result<Self, CredentialsError> {
        Self::new(CredentialSource::from_env()?).await
    }

    /// Where the credentials were resolved from
    pub fn source(&self) -> &CredentialSource {
        &self.source
    }
}

#[async_trait]
impl AccessTokenSource for GoogleTokenSource {
    async fn access_token(&self) -> Result<String, CredentialsError> {
        let token = self
            .provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to get GCP access token");
                CredentialsError::token(e.to_string())
            })?;
        Ok(token.as_str().to_string())
    }
}

impl fmt::Debug for GoogleTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTokenSource")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// A fixed bearer token, for emulators and tests
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, CredentialsError> {
        Ok(self.0.clone())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticToken([REDACTED])")
    }
}
