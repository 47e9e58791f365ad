//! Command implementations

pub mod credentials;
pub mod files;
pub mod secrets;
pub mod upload;

use anyhow::{Context, Result};
use sakit_core::{AccessTokenSource, GoogleTokenSource, SakitConfig, StaticToken};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Environment variable holding a pre-minted bearer token (emulators, CI)
pub const ACCESS_TOKEN_ENV: &str = "SAKIT_ACCESS_TOKEN";

/// Load configuration from `--config` or the working directory
pub fn load_config(path: Option<&Path>) -> Result<SakitConfig> {
    SakitConfig::load(path).context("Failed to load configuration")
}

/// Token source for API calls
///
/// A token in `SAKIT_ACCESS_TOKEN` is used as-is; otherwise credentials are
/// resolved from `GOOGLE_APPLICATION_CREDENTIALS` or the default chain.
pub async fn token_source() -> Result<Arc<dyn AccessTokenSource>> {
    if let Some(token) = std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
    {
        debug!("Using access token from {}", ACCESS_TOKEN_ENV);
        return Ok(Arc::new(StaticToken::new(token.trim())));
    }

    let source = GoogleTokenSource::from_env()
        .await
        .context("Failed to initialize credentials")?;
    Ok(Arc::new(source))
}
