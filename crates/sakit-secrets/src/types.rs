//! Core types for secret access

use crate::error::{Result, SecretError};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum length of a Secret Manager secret ID
const MAX_SECRET_ID_LEN: usize = 255;

/// Number of characters shown by [`SecretValue::preview`]
const PREVIEW_CHARS: usize = 8;

/// Secret payload with automatic zeroing
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(Vec<u8>);

impl SecretValue {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the payload as UTF-8, if it is
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// Parse the payload as a JSON document
    pub fn to_json(&self) -> std::result::Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.0)
    }

    /// Leading characters followed by `...`, for display
    pub fn preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.0);
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&str> for SecretValue {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for SecretValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED {} bytes])", self.0.len())
    }
}

/// Secret version selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecretVersion {
    /// The most recent enabled version
    #[default]
    Latest,
    /// A specific revision (1-based)
    Number(u64),
}

impl fmt::Display for SecretVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for SecretVersion {
    type Err = SecretError;

    /// Accepts `latest`, `3` or `v3`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }

        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        match digits.parse::<u64>() {
            Ok(0) => Err(SecretError::invalid_reference(s, "versions start at 1")),
            Ok(n) => Ok(Self::Number(n)),
            Err(_) => Err(SecretError::invalid_reference(
                s,
                "version must be 'latest' or a positive number",
            )),
        }
    }
}

/// Reference to one version of a secret
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    secret_id: String,
    version: SecretVersion,
}

impl SecretRef {
    /// Reference the latest version of a secret
    pub fn latest(secret_id: impl Into<String>) -> Result<Self> {
        Self::new(secret_id, SecretVersion::Latest)
    }

    /// Reference a specific version of a secret
    pub fn new(secret_id: impl Into<String>, version: SecretVersion) -> Result<Self> {
        let secret_id = secret_id.into();
        validate_secret_id(&secret_id)?;
        Ok(Self { secret_id, version })
    }

    /// Parse `name`, `name@latest`, `name@3` or `name@v3`
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        match reference.split_once('@') {
            Some((name, version)) => Self::new(name, version.parse()?),
            None => Self::latest(reference),
        }
    }

    pub fn secret_id(&self) -> &str {
        &self.secret_id
    }

    pub fn version(&self) -> SecretVersion {
        self.version
    }

    /// Composite cache key: `secret:version`
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.secret_id, self.version)
    }

    /// Full Secret Manager resource name for this version
    pub fn resource_name(&self, project: &str) -> String {
        format!(
            "projects/{}/secrets/{}/versions/{}",
            project, self.secret_id, self.version
        )
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.secret_id, self.version)
    }
}

fn validate_secret_id(secret_id: &str) -> Result<()> {
    if secret_id.is_empty() {
        return Err(SecretError::invalid_reference(
            secret_id,
            "secret name is empty",
        ));
    }
    if secret_id.len() > MAX_SECRET_ID_LEN {
        return Err(SecretError::invalid_reference(
            secret_id,
            format!("secret name exceeds {} characters", MAX_SECRET_ID_LEN),
        ));
    }
    if !secret_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SecretError::invalid_reference(
            secret_id,
            "only letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(())
}

/// Secret listed in a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDescriptor {
    /// Short secret name (last path segment)
    pub name: String,
    pub labels: std::collections::BTreeMap<String, String>,
    pub create_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Version lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    Enabled,
    Disabled,
    Destroyed,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for VersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Destroyed => "DESTROYED",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// One version of a secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescriptor {
    /// Version number as listed by the API
    pub version: String,
    pub state: VersionState,
    pub create_time: Option<chrono::DateTime<chrono::Utc>>,
}
