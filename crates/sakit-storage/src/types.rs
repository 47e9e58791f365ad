//! Object and bucket metadata, content-type detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for text uploads
pub const TEXT_CONTENT_TYPE: &str = "text/plain";

/// Metadata of an uploaded object, as returned by Cloud Storage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub bucket: String,
    pub name: String,
    /// Size in bytes
    #[serde(default, deserialize_with = "u64_from_string")]
    pub size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "u64_from_string")]
    pub generation: u64,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
}

impl ObjectMetadata {
    /// `gs://bucket/name`
    pub fn gs_uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}

/// A bucket as listed by Cloud Storage
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketMetadata {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub storage_class: Option<String>,
    #[serde(default)]
    pub time_created: Option<DateTime<Utc>>,
}

/// The JSON API encodes int64 fields as strings
fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Guess a content type from a file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("txt") | Some("log") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("md") => "text/markdown",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("yaml") | Some("yml") => "application/yaml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") | Some("tgz") => "application/gzip",
        Some("tar") => "application/x-tar",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
