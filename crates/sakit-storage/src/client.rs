//! Cloud Storage client (JSON API): media uploads and bucket listing

use crate::error::{Result, StorageError};
use crate::types::{content_type_for, BucketMetadata, ObjectMetadata, TEXT_CONTENT_TYPE};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use sakit_core::config::DEFAULT_STORAGE_ENDPOINT;
use sakit_core::http::{build_client, error_message, DEFAULT_TIMEOUT};
use sakit_core::AccessTokenSource;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Longest object name Cloud Storage accepts, in bytes
const MAX_OBJECT_NAME_LEN: usize = 1024;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketList {
    #[serde(default)]
    items: Vec<BucketMetadata>,
    next_page_token: Option<String>,
}

/// Uploads objects to and lists buckets in Cloud Storage
pub struct StorageClient {
    http: reqwest::Client,
    endpoint: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl StorageClient {
    /// Create a client against the public endpoint
    pub fn new(tokens: Arc<dyn AccessTokenSource>) -> Result<Self> {
        Self::with_options(tokens, DEFAULT_STORAGE_ENDPOINT, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit endpoint and request timeout
    pub fn with_options(
        tokens: Arc<dyn AccessTokenSource>,
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    /// Upload a local file
    ///
    /// The object name defaults to the file name; the content type is
    /// guessed from the extension.
    pub async fn upload_file(
        &self,
        bucket: &str,
        source: &Path,
        destination: Option<&str>,
    ) -> Result<ObjectMetadata> {
        let destination = match destination {
            Some(name) => name.to_string(),
            None => source
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    StorageError::invalid_name(
                        "object name",
                        format!("{} has no file name", source.display()),
                    )
                })?,
        };

        let bytes = tokio::fs::read(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::LocalFileMissing {
                    path: source.to_path_buf(),
                }
            } else {
                StorageError::LocalFileRead {
                    path: source.to_path_buf(),
                    source: e,
                }
            }
        })?;

        info!(
            "Uploading {} to gs://{}/{}",
            source.display(),
            bucket.trim_start_matches("gs://"),
            destination
        );
        self.upload_bytes(bucket, &destination, bytes, content_type_for(source))
            .await
    }

    /// Upload text content without a local file
    pub async fn upload_text(
        &self,
        bucket: &str,
        destination: &str,
        content: &str,
        content_type: Option<&str>,
    ) -> Result<ObjectMetadata> {
        info!(
            "Uploading content to gs://{}/{}",
            bucket.trim_start_matches("gs://"),
            destination
        );
        self.upload_bytes(
            bucket,
            destination,
            content.as_bytes().to_vec(),
            content_type.unwrap_or(TEXT_CONTENT_TYPE),
        )
        .await
    }

    /// Upload raw bytes as a single media request
    pub async fn upload_bytes(
        &self,
        bucket: &str,
        destination: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<ObjectMetadata> {
        let bucket = normalize_bucket(bucket)?;
        validate_object_name(destination)?;

        let url = self.upload_url(bucket, destination)?;
        let token = self.tokens.access_token().await?;
        let length = bytes.len();

        debug!(url = %url, bytes = length, content_type, "POST");
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify(status, &body, bucket);
            warn!(status = status.as_u16(), error = %err, "Upload failed");
            return Err(err);
        }

        let metadata: ObjectMetadata = response.json().await.map_err(|e| {
            StorageError::InvalidResponse {
                message: e.to_string(),
            }
        })?;

        debug!(uri = %metadata.gs_uri(), size = metadata.size, "Upload complete");
        Ok(metadata)
    }

    /// List every bucket in a project, following pagination
    ///
    /// Requires `storage.buckets.list` on the project.
    pub async fn list_buckets(&self, project: &str) -> Result<Vec<BucketMetadata>> {
        if project.trim().is_empty() {
            return Err(sakit_core::Error::missing_field("project").into());
        }

        let base = self.endpoint_url("storage/v1/b")?;
        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = base.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("project", project);
                if let Some(token) = page_token.as_deref() {
                    query.append_pair("pageToken", token);
                }
            }

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
                let err = classify_list(status, &body, project);
                warn!(status = status.as_u16(), error = %err, "Bucket listing failed");
                return Err(err);
            }

            let page: BucketList = response.json().await.map_err(|e| {
                StorageError::InvalidResponse {
                    message: e.to_string(),
                }
            })?;
            buckets.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(project, count = buckets.len(), "Listed buckets");
        Ok(buckets)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.endpoint, path)).map_err(|e| {
            sakit_core::Error::invalid_config(format!(
                "invalid Cloud Storage endpoint '{}': {}",
                self.endpoint, e
            ))
            .into()
        })
    }

    fn upload_url(&self, bucket: &str, destination: &str) -> Result<Url> {
        let mut url = self.endpoint_url(&format!("upload/storage/v1/b/{}/o", bucket))?;

        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", destination);
        Ok(url)
    }
}

impl std::fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Strip a `gs://` prefix and validate the bucket name
fn normalize_bucket(bucket: &str) -> Result<&str> {
    let name = bucket.trim().trim_start_matches("gs://").trim_end_matches('/');

    if !(3..=222).contains(&name.len()) {
        return Err(StorageError::invalid_name(
            "bucket name",
            format!("'{}' must be 3-222 characters", name),
        ));
    }
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    let valid_ends = name
        .chars()
        .next()
        .zip(name.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if !valid_chars || !valid_ends {
        return Err(StorageError::invalid_name(
            "bucket name",
            format!(
                "'{}' may only contain lowercase letters, digits, '-', '_' and '.'",
                name
            ),
        ));
    }
    Ok(name)
}

fn validate_object_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StorageError::invalid_name("object name", "must not be empty"));
    }
    if name.len() > MAX_OBJECT_NAME_LEN {
        return Err(StorageError::invalid_name(
            "object name",
            format!("exceeds {} bytes", MAX_OBJECT_NAME_LEN),
        ));
    }
    if name == "." || name == ".." || name.contains('\r') || name.contains('\n') {
        return Err(StorageError::invalid_name(
            "object name",
            format!("'{}' is not allowed", name.escape_debug()),
        ));
    }
    Ok(())
}

fn classify(status: StatusCode, body: &str, bucket: &str) -> StorageError {
    let message = error_message(body);
    match status {
        StatusCode::NOT_FOUND => StorageError::BucketNotFound {
            bucket: bucket.to_string(),
        },
        StatusCode::FORBIDDEN => StorageError::PermissionDenied {
            bucket: bucket.to_string(),
            message,
        },
        StatusCode::UNAUTHORIZED => StorageError::Unauthenticated { message },
        status => StorageError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn classify_list(status: StatusCode, body: &str, project: &str) -> StorageError {
    let message = error_message(body);
    match status {
        StatusCode::FORBIDDEN => StorageError::ListDenied {
            project: project.to_string(),
            message,
        },
        StatusCode::UNAUTHORIZED => StorageError::Unauthenticated { message },
        status => StorageError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

fn transport_error(e: reqwest::Error) -> StorageError {
    let message = if e.is_timeout() {
        format!("request timed out: {}", e)
    } else {
        e.to_string()
    };
    StorageError::Transport { message }
}
