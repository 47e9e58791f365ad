//! Upload files and generated content to Cloud Storage

use anyhow::{anyhow, Context, Result};
use clap::Args;
use sakit_core::SakitConfig;
use sakit_storage::{ObjectMetadata, StorageClient};
use std::path::{Path, PathBuf};

use super::{load_config, token_source};
use crate::output;

/// Name of the generated test file
const TEST_FILE_NAME: &str = "test-upload.txt";

/// Prefix for objects created by the test upload
const TEST_PREFIX: &str = "test-uploads";

#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Bucket name (gs:// prefix optional); falls back to config and the setup hint file
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Local file to upload
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Destination object name (defaults to the file name)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// Create a test file and upload it
    #[arg(long)]
    pub create_test_file: bool,
}

pub async fn run(args: UploadArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    output::header("Google Cloud Storage Upload");
    println!();

    let bucket = resolve_bucket(args.bucket.as_deref(), &config)?;
    output::kv("Bucket", &format!("gs://{}", bucket.trim_start_matches("gs://")));
    println!();

    let client = StorageClient::with_options(
        token_source().await?,
        &config.storage.endpoint,
        config.http.timeout(),
    )?;

    match args.file.filter(|_| !args.create_test_file) {
        Some(file) => {
            let meta = upload_file(&client, &bucket, &file, args.destination.as_deref()).await?;
            print_metadata(&meta);
        }
        None => {
            let test_file = create_test_file()?;
            let destination = args
                .destination
                .unwrap_or_else(|| format!("{}/{}", TEST_PREFIX, TEST_FILE_NAME));
            let meta = upload_file(&client, &bucket, &test_file, Some(&destination)).await?;
            print_metadata(&meta);

            println!();
            let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f");
            let content = format!(
                "Test upload at {}\nGenerated by sakit {}",
                timestamp,
                env!("CARGO_PKG_VERSION")
            );
            let object = format!("{}/timestamp-{}.txt", TEST_PREFIX, timestamp);

            let spinner = output::spinner(&format!("Uploading content to gs://{}...", object));
            let result = client.upload_text(&bucket, &object, &content, None).await;
            spinner.finish_and_clear();

            let meta = result.context("Error uploading content")?;
            output::success("Content uploaded successfully!");
            output::kv("GCS URI", &meta.gs_uri());
            output::kv("Size", &format!("{} bytes", meta.size));
        }
    }

    println!();
    output::success("Upload completed successfully!");
    println!();
    println!("Note: With Storage Object Creator role, you can:");
    println!("  • Upload new files ✓");
    println!("  • Read/download files ✗");
    println!("  • Delete files ✗");
    Ok(())
}

/// `--bucket`, then config/`SAKIT_BUCKET`, then the setup script's hint file
fn resolve_bucket(flag: Option<&str>, config: &SakitConfig) -> Result<String> {
    if let Some(bucket) = flag.filter(|b| !b.trim().is_empty()) {
        return Ok(bucket.trim().to_string());
    }

    config.resolve_bucket().ok_or_else(|| {
        output::hints(&[
            "Usage:".to_string(),
            "  sakit upload --bucket demo-upload-bucket-YOUR_PROJECT".to_string(),
            "Or set storage.bucket in sakit.yaml, or SAKIT_BUCKET".to_string(),
        ]);
        anyhow!("No bucket specified")
    })
}

async fn upload_file(
    client: &StorageClient,
    bucket: &str,
    file: &Path,
    destination: Option<&str>,
) -> Result<ObjectMetadata> {
    let spinner = output::spinner(&format!("Uploading {}...", file.display()));
    let result = client.upload_file(bucket, file, destination).await;
    spinner.finish_and_clear();

    let meta = result.with_context(|| format!("Failed to upload {}", file.display()))?;
    output::success("File uploaded successfully!");
    Ok(meta)
}

fn print_metadata(meta: &ObjectMetadata) {
    output::kv("GCS URI", &meta.gs_uri());
    output::kv("Size", &format!("{} bytes", meta.size));
    output::kv(
        "Content Type",
        meta.content_type.as_deref().unwrap_or("unknown"),
    );
}

/// Write the demo test file to the temp directory
fn create_test_file() -> Result<PathBuf> {
    let path = std::env::temp_dir().join(TEST_FILE_NAME);
    std::fs::write(&path, test_file_content(&chrono::Local::now().to_rfc3339()))
        .with_context(|| format!("Failed to create test file {}", path.display()))?;

    output::info(&format!("Created test file: {}", path.display()));
    Ok(path)
}

fn test_file_content(created_at: &str) -> String {
    format!(
        "Test File for GCS Upload
========================

This file was created at: {}

This demonstrates uploading a file to Google Cloud Storage
using a Service Account with Storage Object Creator role.

The Service Account can:
  ✓ Upload this file
  ✗ Read this file back (no read permission)
  ✗ Delete this file (no delete permission)

This follows the Principle of Least Privilege!
",
        created_at
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_bucket_precedence() {
        let dir = TempDir::new().unwrap();
        let hint = dir.path().join("bucket.txt");
        std::fs::write(&hint, "from-hint-file\n").unwrap();

        let mut config = SakitConfig::default();
        config.storage.bucket_hint_file = hint;

        assert_eq!(resolve_bucket(Some("flag"), &config).unwrap(), "flag");
        assert_eq!(resolve_bucket(None, &config).unwrap(), "from-hint-file");

        config.storage.bucket = Some("from-config".to_string());
        assert_eq!(resolve_bucket(Some("  "), &config).unwrap(), "from-config");
    }

    #[test]
    fn test_resolve_bucket_missing() {
        let mut config = SakitConfig::default();
        config.storage.bucket_hint_file = PathBuf::from("/nonexistent/bucket.txt");
        let err = resolve_bucket(None, &config).unwrap_err();
        assert_eq!(err.to_string(), "No bucket specified");
    }

    #[test]
    fn test_file_content_mentions_timestamp() {
        let content = test_file_content("2024-01-15T10:30:00+00:00");
        assert!(content.contains("created at: 2024-01-15T10:30:00+00:00"));
        assert!(content.contains("Principle of Least Privilege"));
    }
}
