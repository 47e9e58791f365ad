//! Walk-through of secrets mounted as files by the CSI driver

use anyhow::Result;
use clap::Args;
use sakit_core::{CredentialSource, SakitConfig, CREDENTIALS_ENV};
use sakit_secrets::{SecretFileReader, API_KEY_FILE, DATABASE_URL_FILE};
use sakit_storage::StorageClient;
use std::path::{Path, PathBuf};

use super::{load_config, token_source};
use crate::output;

#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Directory holding mounted secrets (defaults to /var/secrets, then the local fallback)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// File holding the API key
    #[arg(long, default_value = API_KEY_FILE)]
    pub api_key_file: String,

    /// File holding the database connection string
    #[arg(long, default_value = DATABASE_URL_FILE)]
    pub database_url_file: String,

    /// Also list the project's buckets with the mounted credentials
    #[arg(long)]
    pub list_buckets: bool,
}

pub async fn run(args: FilesArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    output::header("Secret Manager CSI Driver - File-based Secret Access");
    println!();

    let reader = match args.dir {
        Some(dir) => SecretFileReader::new(dir),
        None => SecretFileReader::from_config(&config),
    };
    if reader.secrets_dir() == config.secrets.mount_dir {
        output::success(&format!(
            "Running in GKE pod (using {})",
            reader.secrets_dir().display()
        ));
    } else {
        output::success(&format!(
            "Running locally (using {})",
            reader.secrets_dir().display()
        ));
    }

    let key_project = example_credentials();
    if args.list_buckets {
        example_list_buckets(&config, key_project).await;
    }
    example_api_key(&reader, &args.api_key_file);
    example_database_url(&reader, &args.database_url_file);

    println!();
    output::header("All examples complete!");
    Ok(())
}

/// Returns the key's project when a key file was loaded
fn example_credentials() -> Option<String> {
    output::section("Example 1: Service Account Key from GOOGLE_APPLICATION_CREDENTIALS");

    let result = CredentialSource::from_env().and_then(|source| {
        let key = source.load_key()?;
        Ok((source, key))
    });

    match result {
        Ok((source, Some(key))) => {
            if let Some(path) = source.key_file() {
                output::success(&format!("Credentials loaded from: {}", path.display()));
            }
            output::success(&format!("Service Account: {}", key.client_email()));
            output::success(&format!("Project: {}", key.project_id()));
            Some(key.project_id().to_string())
        }
        Ok((_, None)) => {
            output::error(&format!("{} environment variable not set", CREDENTIALS_ENV));
            output::hints(&[
                "In Kubernetes, set it to the path of the mounted key file".to_string(),
            ]);
            None
        }
        Err(e) => {
            output::error(&format!("Error: {}", e));
            output::hints(&e.hints());
            None
        }
    }
}

/// List buckets in the key's project, else the configured project
async fn example_list_buckets(config: &SakitConfig, key_project: Option<String>) {
    let result = async {
        let project = match key_project {
            Some(project) => project,
            None => config.project_id()?.to_string(),
        };
        let client = StorageClient::with_options(
            token_source().await?,
            &config.storage.endpoint,
            config.http.timeout(),
        )?;

        let spinner = output::spinner("Listing buckets...");
        let listed = client.list_buckets(&project).await;
        spinner.finish_and_clear();
        Ok::<_, anyhow::Error>((project, listed?))
    }
    .await;

    match result {
        Ok((project, buckets)) => {
            println!("\nBuckets in project '{}':", project);
            if buckets.is_empty() {
                output::info("No buckets found");
            }
            for bucket in &buckets {
                println!("  - {}", bucket.name);
            }
        }
        Err(e) => output::report(&e),
    }
}

fn example_api_key(reader: &SecretFileReader, filename: &str) {
    output::section("Example 2: API Key");

    match reader.load_api_key(filename) {
        Ok(key) => {
            output::success(&format!("API key loaded from {}", filename));
            output::kv("Key length", &format!("{} characters", key.len()));
            output::kv("Key preview", &key.preview());
        }
        Err(e) => {
            output::error(&format!("Error: {}", e));
            output::hints(&e.hints());
        }
    }
}

fn example_database_url(reader: &SecretFileReader, filename: &str) {
    output::section("Example 3: Database Connection String");

    match reader.load_database_url(filename) {
        Ok((_url, info)) => {
            output::success(&format!("Database URL loaded from {}", filename));
            output::kv("Protocol", &info.protocol);
            if let Some(host) = &info.host {
                output::kv("Host", host);
            }
            if let Some(db) = &info.database {
                output::kv("Database", db);
            }
        }
        Err(e) => {
            output::error(&format!("Error: {}", e));
            output::hints(&e.hints());
        }
    }
}
