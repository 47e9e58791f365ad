//! # sakit-secrets
//!
//! Secret access for sakit:
//! - Google Secret Manager REST client (access, list secrets, list versions)
//! - Secrets mounted as files by the Secrets Store CSI driver
//! - An in-memory expiring cache and a caching decorator for any fetcher
//!
//! ## Example
//!
//! ```no_run
//! use sakit_core::GoogleTokenSource;
//! use sakit_secrets::{CachedSecretClient, SecretCache, SecretManagerClient, SecretRef};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = Arc::new(GoogleTokenSource::from_env().await?);
//! let client = SecretManagerClient::new("my-project-dev", tokens)?;
//! let cached = CachedSecretClient::new(client, SecretCache::new(Duration::from_secs(300)));
//!
//! let api_key = cached.fetch(&SecretRef::parse("demo-app-api-key")?).await?;
//! println!("API key: {}", api_key.preview());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod file;
pub mod gcp;
pub mod types;

pub use cache::{CacheStats, SecretCache};
pub use error::{Result, SecretError};
pub use fetcher::{CachedSecretClient, SecretFetcher};
pub use file::{ConnectionInfo, SecretFileReader, API_KEY_FILE, DATABASE_URL_FILE};
pub use gcp::SecretManagerClient;
pub use types::{
    SecretDescriptor, SecretRef, SecretValue, SecretVersion, VersionDescriptor, VersionState,
};
