//! # sakit-storage
//!
//! Uploads to Google Cloud Storage through the JSON API using a service
//! account identity. Uploads need only the `roles/storage.objectCreator`
//! role; listing buckets additionally needs `storage.buckets.list`.

pub mod client;
pub mod error;
pub mod types;

pub use client::StorageClient;
pub use error::{Result, StorageError};
pub use types::{
    content_type_for, BucketMetadata, ObjectMetadata, DEFAULT_CONTENT_TYPE, TEXT_CONTENT_TYPE,
};
