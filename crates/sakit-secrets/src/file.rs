//! Secrets mounted as files by the Secrets Store CSI driver
//!
//! In a pod the driver mounts each secret as a file under `/var/secrets`.
//! Filenames are resolved strictly inside the configured directory.

use crate::error::{Result, SecretError};
use crate::types::SecretValue;
use sakit_core::{SakitConfig, ServiceAccountKey};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

/// Default file holding the API key
pub const API_KEY_FILE: &str = "api-key.txt";

/// Default file holding the database connection string
pub const DATABASE_URL_FILE: &str = "database-url.txt";

/// Reads secrets from a mounted directory
#[derive(Debug, Clone)]
pub struct SecretFileReader {
    secrets_dir: PathBuf,
}

impl SecretFileReader {
    pub fn new(secrets_dir: impl Into<PathBuf>) -> Self {
        Self {
            secrets_dir: secrets_dir.into(),
        }
    }

    /// Reader for the configured mount, or the local fallback directory
    pub fn from_config(config: &SakitConfig) -> Self {
        Self::new(config.secrets_dir())
    }

    pub fn secrets_dir(&self) -> &Path {
        &self.secrets_dir
    }

    /// Read and parse a JSON secret file
    pub fn read_json(&self, filename: &str) -> Result<serde_json::Value> {
        let path = self.resolve(filename)?;
        let content = read_file(&path)?;
        serde_json::from_slice(content.as_bytes())
            .map_err(|source| SecretError::FileParse { path, source })
    }

    /// Read a UTF-8 text secret file, trimmed of surrounding whitespace
    pub fn read_text(&self, filename: &str) -> Result<SecretValue> {
        let path = self.resolve(filename)?;
        let content = read_file(&path)?;
        let trimmed = content.as_bytes().trim_ascii();
        if std::str::from_utf8(trimmed).is_err() {
            return Err(SecretError::invalid_value(filename, "file is not valid UTF-8 text"));
        }
        Ok(SecretValue::new(trimmed.to_vec()))
    }

    /// Read and validate a service account key file
    pub fn read_service_account_key(&self, filename: &str) -> Result<ServiceAccountKey> {
        let value = self.read_json(filename)?;
        Ok(ServiceAccountKey::from_json(&value)?)
    }

    /// Load a non-empty API key
    pub fn load_api_key(&self, filename: &str) -> Result<SecretValue> {
        let key = self.read_text(filename)?;
        if key.is_empty() {
            return Err(SecretError::invalid_value(filename, "API key file is empty"));
        }

        debug!(file = filename, length = key.len(), "Loaded API key");
        Ok(key)
    }

    /// Load a database connection string and its redacted summary
    pub fn load_database_url(&self, filename: &str) -> Result<(SecretValue, ConnectionInfo)> {
        let url = self.read_text(filename)?;
        if url.is_empty() {
            return Err(SecretError::invalid_value(
                filename,
                "database URL file is empty",
            ));
        }

        let info = ConnectionInfo::parse(filename, &url)?;
        debug!(file = filename, protocol = %info.protocol, "Loaded database URL");
        Ok((url, info))
    }

    /// Resolve a filename inside the secrets directory
    fn resolve(&self, filename: &str) -> Result<PathBuf> {
        let traversal = || SecretError::PathTraversal {
            name: filename.to_string(),
            dir: self.secrets_dir.clone(),
        };

        let relative = Path::new(filename);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if filename.is_empty() || !only_normal {
            return Err(traversal());
        }

        let path = self.secrets_dir.join(relative);
        if !path.exists() {
            return Err(SecretError::FileNotFound { path });
        }

        // Symlinks (the CSI driver's ..data links) must still land inside the mount
        let canonical_dir = self
            .secrets_dir
            .canonicalize()
            .map_err(|source| SecretError::FileRead {
                path: self.secrets_dir.clone(),
                source,
            })?;
        let canonical = path.canonicalize().map_err(|source| SecretError::FileRead {
            path: path.clone(),
            source,
        })?;
        if !canonical.starts_with(&canonical_dir) {
            return Err(traversal());
        }

        Ok(path)
    }
}

fn read_file(path: &Path) -> Result<SecretValue> {
    std::fs::read(path)
        .map(SecretValue::new)
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => SecretError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => SecretError::FileRead {
                path: path.to_path_buf(),
                source,
            },
        })
}

/// Non-sensitive parts of a database connection string
///
/// Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub protocol: String,
    /// Host with port, when present
    pub host: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
}

impl ConnectionInfo {
    /// Parse a connection string; `source` names it in errors
    pub fn parse(source: &str, value: &SecretValue) -> Result<Self> {
        let text = value
            .as_str()
            .ok_or_else(|| SecretError::invalid_value(source, "database URL is not UTF-8"))?;

        if !text.contains("://") {
            return Err(SecretError::invalid_value(
                source,
                "invalid database URL format (expected scheme://...)",
            ));
        }

        let url = Url::parse(text)
            .map_err(|e| SecretError::invalid_value(source, format!("invalid database URL: {}", e)))?;

        let host = url.host_str().map(|host| match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        });
        let database = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|db| !db.is_empty())
            .map(str::to_string);
        let username = Some(url.username())
            .filter(|user| !user.is_empty())
            .map(str::to_string);

        Ok(Self {
            protocol: url.scheme().to_string(),
            host,
            database,
            username,
        })
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.protocol)?;
        if let Some(user) = &self.username {
            write!(f, "{}:****@", user)?;
        }
        if let Some(host) = &self.host {
            f.write_str(host)?;
        }
        if let Some(db) = &self.database {
            write!(f, "/{}", db)?;
        }
        Ok(())
    }
}
