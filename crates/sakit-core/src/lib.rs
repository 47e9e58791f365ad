//! # sakit-core
//!
//! Core library for the sakit workspace providing:
//! - Configuration file parsing (sakit.yaml) with environment overrides
//! - Credential resolution from `GOOGLE_APPLICATION_CREDENTIALS`
//! - Service account key validation
//! - Access token sources for the Google REST APIs
//! - Shared HTTP client construction and API error decoding

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;

pub use auth::{AccessTokenSource, GoogleTokenSource, StaticToken, CLOUD_PLATFORM_SCOPE};
pub use config::{CacheConfig, HttpConfig, SakitConfig, SecretsConfig, StorageConfig};
pub use credentials::{CredentialSource, CredentialsError, ServiceAccountKey, CREDENTIALS_ENV};
pub use error::{Error, ErrorKind, Result};
