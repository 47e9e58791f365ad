//! Google Secret Manager REST client
//!
//! Talks to the v1 REST surface:
//! - `GET /v1/projects/{p}/secrets/{s}/versions/{v}:access`
//! - `GET /v1/projects/{p}/secrets`
//! - `GET /v1/projects/{p}/secrets/{s}/versions`
//!
//! Bearer tokens come from an [`AccessTokenSource`]; the endpoint is
//! configurable so emulators and test servers can stand in for Google.

use crate::error::{Result, SecretError};
use crate::fetcher::SecretFetcher;
use crate::types::{SecretDescriptor, SecretRef, SecretValue, VersionDescriptor, VersionState};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use sakit_core::config::DEFAULT_SECRET_MANAGER_ENDPOINT;
use sakit_core::http::{build_client, error_message, DEFAULT_TIMEOUT};
use sakit_core::AccessTokenSource;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;
use zeroize::Zeroize;

#[derive(Deserialize)]
struct AccessResponse {
    payload: Payload,
}

#[derive(Deserialize)]
struct Payload {
    #[serde(default)]
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSecretsResponse {
    #[serde(default)]
    secrets: Vec<SecretResource>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretResource {
    name: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    create_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListVersionsResponse {
    #[serde(default)]
    versions: Vec<VersionResource>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionResource {
    name: String,
    #[serde(default)]
    state: VersionState,
    create_time: Option<DateTime<Utc>>,
}

/// What a request was about, for error classification
enum Target<'a> {
    Project,
    Secret(&'a str),
    Version(&'a SecretRef),
}

/// Secret Manager client scoped to one project
pub struct SecretManagerClient {
    http: reqwest::Client,
    endpoint: String,
    project: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl SecretManagerClient {
    /// Create a client against the public endpoint
    pub fn new(project: impl Into<String>, tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        Self::with_options(
            project,
            tokens,
            DEFAULT_SECRET_MANAGER_ENDPOINT,
            DEFAULT_TIMEOUT,
        )
    }

    /// Create a client with an explicit endpoint and request timeout
    pub fn with_options(
        project: impl Into<String>,
        tokens: Arc<dyn AccessTokenSource>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let project = project.into();
        if project.trim().is_empty() {
            return Err(sakit_core::Error::missing_field("project").into());
        }

        Ok(Self {
            http: build_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project,
            tokens,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Access a secret version and decode its payload
    pub async fn access_secret_version(&self, secret: &SecretRef) -> Result<SecretValue> {
        let resource = secret.resource_name(&self.project);
        let url = self.url(&format!("{}:access", resource))?;

        let response: AccessResponse = self.get_json(url, Target::Version(secret)).await?;
        let mut encoded = response.payload.data;
        let decoded = STANDARD.decode(encoded.as_bytes());
        encoded.zeroize();

        let bytes = decoded.map_err(|e| {
            SecretError::invalid_payload(format!("payload of {} is not base64: {}", resource, e))
        })?;

        debug!(secret = %secret, bytes = bytes.len(), "Accessed secret version");
        Ok(SecretValue::new(bytes))
    }

    /// List every secret in the project, following pagination
    pub async fn list_secrets(&self) -> Result<Vec<SecretDescriptor>> {
        let base = self.url(&format!("projects/{}/secrets", self.project))?;
        let mut secrets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = with_page_token(&base, page_token.as_deref());
            let page: ListSecretsResponse = self.get_json(url, Target::Project).await?;

            secrets.extend(page.secrets.into_iter().map(|s| SecretDescriptor {
                name: last_segment(&s.name),
                labels: s.labels,
                create_time: s.create_time,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(project = %self.project, count = secrets.len(), "Listed secrets");
        Ok(secrets)
    }

    /// List every version of a secret, following pagination
    pub async fn list_secret_versions(&self, secret_id: &str) -> Result<Vec<VersionDescriptor>> {
        // Validates the name before it lands in a URL path
        SecretRef::latest(secret_id)?;

        let base = self.url(&format!(
            "projects/{}/secrets/{}/versions",
            self.project, secret_id
        ))?;
        let mut versions = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = with_page_token(&base, page_token.as_deref());
            let page: ListVersionsResponse = self.get_json(url, Target::Secret(secret_id)).await?;

            versions.extend(page.versions.into_iter().map(|v| VersionDescriptor {
                version: last_segment(&v.name),
                state: v.state,
                create_time: v.create_time,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(secret = secret_id, count = versions.len(), "Listed secret versions");
        Ok(versions)
    }

    fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/v1/{}", self.endpoint, path)).map_err(|e| {
            sakit_core::Error::invalid_config(format!(
                "invalid Secret Manager endpoint '{}': {}",
                self.endpoint, e
            ))
            .into()
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, target: Target<'_>) -> Result<T> {
        let token = self.tokens.access_token().await?;

        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = self.classify(status, &body, target);
            warn!(status = status.as_u16(), error = %err, "Secret Manager request failed");
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SecretError::invalid_payload(format!("unexpected response: {}", e)))
    }

    fn classify(&self, status: StatusCode, body: &str, target: Target<'_>) -> SecretError {
        let message = error_message(body);
        let project = self.project.clone();

        match (status, target) {
            (StatusCode::NOT_FOUND, Target::Version(secret)) => SecretError::NotFound {
                project,
                secret: secret.secret_id().to_string(),
                version: secret.version().to_string(),
            },
            (StatusCode::NOT_FOUND, Target::Secret(secret)) => SecretError::SecretNotFound {
                project,
                secret: secret.to_string(),
            },
            (StatusCode::FORBIDDEN, target) => {
                let resource = match target {
                    Target::Project => format!("projects/{}", self.project),
                    Target::Secret(secret) => {
                        format!("projects/{}/secrets/{}", self.project, secret)
                    }
                    Target::Version(secret) => secret.resource_name(&self.project),
                };
                SecretError::PermissionDenied {
                    project,
                    resource,
                    message,
                }
            }
            (StatusCode::UNAUTHORIZED, _) => SecretError::Unauthenticated { message },
            (status, _) => SecretError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl SecretFetcher for SecretManagerClient {
    async fn fetch(&self, secret: &SecretRef) -> Result<SecretValue> {
        self.access_secret_version(secret).await
    }
}

impl std::fmt::Debug for SecretManagerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerClient")
            .field("endpoint", &self.endpoint)
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

fn transport_error(e: reqwest::Error) -> SecretError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    };
    SecretError::Transport { message }
}

fn with_page_token(base: &Url, token: Option<&str>) -> Url {
    let mut url = base.clone();
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("pageToken", token);
    }
    url
}

fn last_segment(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}
