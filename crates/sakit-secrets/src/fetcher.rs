//! Secret fetch capability and the caching decorator

use crate::cache::{CacheStats, SecretCache};
use crate::error::Result;
use crate::types::{SecretRef, SecretValue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Anything that can resolve a secret version to its payload
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    async fn fetch(&self, secret: &SecretRef) -> Result<SecretValue>;
}

#[async_trait]
impl<T: SecretFetcher + ?Sized> SecretFetcher for Arc<T> {
    async fn fetch(&self, secret: &SecretRef) -> Result<SecretValue> {
        (**self).fetch(secret).await
    }
}

/// Wraps a fetcher with an expiring cache
///
/// Itself a [`SecretFetcher`], so it can stand in wherever the inner
/// fetcher is used.
#[derive(Debug)]
pub struct CachedSecretClient<F> {
    inner: F,
    cache: SecretCache,
}

impl<F: SecretFetcher> CachedSecretClient<F> {
    pub fn new(inner: F, cache: SecretCache) -> Self {
        Self { inner, cache }
    }

    /// Fetch through the cache
    pub async fn fetch(&self, secret: &SecretRef) -> Result<SecretValue> {
        let key = secret.cache_key();
        self.cache
            .fetch_with_cache(&key, || async {
                debug!(secret = %secret, "Fetching secret from source");
                self.inner.fetch(secret).await
            })
            .await
    }

    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

#[async_trait]
impl<F: SecretFetcher> SecretFetcher for CachedSecretClient<F> {
    async fn fetch(&self, secret: &SecretRef) -> Result<SecretValue> {
        CachedSecretClient::fetch(self, secret).await
    }
}
