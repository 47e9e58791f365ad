//! Configuration file loading and parsing
//!
//! Settings come from, in increasing precedence:
//! 1. Built-in defaults
//! 2. `sakit.yaml` (explicit path, or searched in the working directory)
//! 3. Environment variables (`SAKIT_*`, `GOOGLE_CLOUD_PROJECT`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["sakit.yaml", "sakit.yml"];

/// Default Secret Manager API endpoint
pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Default Cloud Storage API endpoint
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SakitConfig {
    /// GCP project ID (not project number)
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// Path the configuration was loaded from, if any
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Cloud Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Bucket name (without the gs:// prefix)
    #[serde(default)]
    pub bucket: Option<String>,

    /// File written by the bucket setup script holding the bucket name
    #[serde(default = "default_bucket_hint_file")]
    pub bucket_hint_file: PathBuf,

    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
}

/// Secret Manager and mounted-secret settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsConfig {
    #[serde(default = "default_secret_manager_endpoint")]
    pub endpoint: String,

    /// Directory where the CSI driver mounts secrets
    #[serde(default = "default_mount_dir")]
    pub mount_dir: PathBuf,

    /// Directory used when `mount_dir` is absent (local runs)
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: PathBuf,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// Secret cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Whether caching is enabled
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Cache TTL in seconds; zero or negative disables reuse
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: i64,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_bucket_hint_file() -> PathBuf {
    PathBuf::from("/tmp/demo-bucket-name.txt")
}

fn default_storage_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_secret_manager_endpoint() -> String {
    DEFAULT_SECRET_MANAGER_ENDPOINT.to_string()
}

fn default_mount_dir() -> PathBuf {
    PathBuf::from("/var/secrets")
}

fn default_fallback_dir() -> PathBuf {
    PathBuf::from("/tmp/demo-app-secrets")
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> i64 {
    300 // 5 minutes
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            bucket_hint_file: default_bucket_hint_file(),
            endpoint: default_storage_endpoint(),
        }
    }
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_secret_manager_endpoint(),
            mount_dir: default_mount_dir(),
            fallback_dir: default_fallback_dir(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    /// TTL as a duration, negative values clamped to zero
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.max(0) as u64)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl SakitConfig {
    /// Load configuration from the given path or the working directory,
    /// then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::find_config(Path::new(".")) {
                Some(found) => Self::from_file(&found)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let mut config: SakitConfig = serde_yaml_ng::from_str(&content)?;
        config.source_path = Some(path.to_path_buf());
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Search a directory for a configuration file
    fn find_config(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Apply environment overrides using the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(project) = non_empty("SAKIT_PROJECT").or_else(|| non_empty("GOOGLE_CLOUD_PROJECT"))
        {
            self.project = Some(project);
        }

        if let Some(bucket) = non_empty("SAKIT_BUCKET") {
            self.storage.bucket = Some(bucket.trim_start_matches("gs://").to_string());
        }

        if let Some(dir) = non_empty("SAKIT_SECRETS_DIR") {
            self.secrets.mount_dir = PathBuf::from(dir);
        }

        if let Some(ttl) = non_empty("SAKIT_CACHE_TTL") {
            self.secrets.cache.ttl_seconds = ttl.trim().parse().map_err(|_| {
                Error::invalid_config(format!("SAKIT_CACHE_TTL must be an integer, got '{}'", ttl))
            })?;
        }

        Ok(())
    }

    /// The configured project ID
    pub fn project_id(&self) -> Result<&str> {
        self.project
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::missing_field("project (set SAKIT_PROJECT or use --project)"))
    }

    /// The bucket from config, falling back to the setup script's hint file
    pub fn resolve_bucket(&self) -> Option<String> {
        if let Some(bucket) = self.storage.bucket.as_deref().filter(|b| !b.is_empty()) {
            return Some(bucket.to_string());
        }

        let hint = expand_path(&self.storage.bucket_hint_file);
        match fs::read_to_string(&hint) {
            Ok(content) => {
                let bucket = content.trim();
                if bucket.is_empty() {
                    None
                } else {
                    debug!("Using bucket from {}", hint.display());
                    Some(bucket.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// The mounted-secrets directory, or the local fallback when not mounted
    pub fn secrets_dir(&self) -> PathBuf {
        let mount = expand_path(&self.secrets.mount_dir);
        if mount.exists() {
            mount
        } else {
            expand_path(&self.secrets.fallback_dir)
        }
    }
}

/// Expand a leading `~` in a path
pub fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}
