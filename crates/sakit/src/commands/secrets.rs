//! Secret Manager commands

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use sakit_core::SakitConfig;
use sakit_secrets::{
    CachedSecretClient, ConnectionInfo, SecretCache, SecretError, SecretManagerClient, SecretRef,
    SecretVersion,
};
use std::path::Path;
use std::time::{Duration, Instant};

use super::{load_config, token_source};
use crate::cli::ProjectArgs;
use crate::output;

/// Secret names used by the walk-through
const SA_KEY_SECRET: &str = "demo-app-sa-key";
const API_KEY_SECRET: &str = "demo-app-api-key";
const DB_URL_SECRET: &str = "demo-app-db-url";

#[derive(Subcommand, Debug)]
pub enum SecretsCommands {
    /// Access a secret version and print its payload
    Get(GetArgs),

    /// List secrets in the project
    List(ListArgs),

    /// List versions of a secret
    Versions(VersionsArgs),

    /// Walk through common secret access patterns
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
#[command(disable_version_flag = true)]
pub struct GetArgs {
    /// Secret name, optionally with @version
    pub secret: String,

    /// Version to access (number or "latest"; defaults to latest)
    #[arg(long)]
    pub version: Option<String>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct VersionsArgs {
    /// Secret name
    pub secret: String,

    #[command(flatten)]
    pub project: ProjectArgs,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// TTL in seconds for the caching example (defaults to the configured cache)
    #[arg(long)]
    pub cache_ttl: Option<u64>,

    #[command(flatten)]
    pub project: ProjectArgs,
}

pub async fn run(cmd: SecretsCommands, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;

    match cmd {
        SecretsCommands::Get(args) => get(args, &config).await,
        SecretsCommands::List(args) => list(args, &config).await,
        SecretsCommands::Versions(args) => versions(args, &config).await,
        SecretsCommands::Demo(args) => demo(args, &config).await,
    }
}

/// Build a client for `--project`, or the configured project
async fn client(project: &ProjectArgs, config: &SakitConfig) -> Result<SecretManagerClient> {
    let project = match project.project.as_deref() {
        Some(p) => p.to_string(),
        None => config.project_id()?.to_string(),
    };

    let client = SecretManagerClient::with_options(
        project,
        token_source().await?,
        &config.secrets.endpoint,
        config.http.timeout(),
    )?;
    Ok(client)
}

fn banner(client: &SecretManagerClient) {
    output::header("Secret Manager Direct Access");
    output::kv("Project", client.project());
}

/// The secret named by `name[@version]` and `--version`, which must not both give a version
fn secret_ref(secret: &str, version: Option<&str>) -> Result<SecretRef> {
    match (secret.contains('@'), version) {
        (true, Some(flag)) => bail!(
            "Secret '{}' already names a version; drop --version {} or the @ suffix",
            secret,
            flag
        ),
        (true, None) => Ok(SecretRef::parse(secret)?),
        (false, version) => Ok(SecretRef::new(
            secret,
            version.unwrap_or("latest").parse()?,
        )?),
    }
}

async fn get(args: GetArgs, config: &SakitConfig) -> Result<()> {
    let secret = secret_ref(&args.secret, args.version.as_deref())?;

    let client = client(&args.project, config).await?;
    banner(&client);
    println!("\nAccessing secret '{}' version '{}'...", secret.secret_id(), secret.version());

    let value = client
        .access_secret_version(&secret)
        .await
        .with_context(|| format!("Failed to access secret '{}'", secret))?;

    match value.to_json() {
        Ok(json) => {
            output::success("Secret retrieved (JSON):");
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            output::success("Secret retrieved (text):");
            println!("{}", String::from_utf8_lossy(value.as_bytes()));
        }
    }
    Ok(())
}

async fn list(args: ListArgs, config: &SakitConfig) -> Result<()> {
    let client = client(&args.project, config).await?;
    banner(&client);

    let spinner = output::spinner("Listing secrets...");
    let result = client.list_secrets().await;
    spinner.finish_and_clear();
    let secrets = result.context("Failed to list secrets")?;

    output::section(&format!("Secrets in project '{}'", client.project()));
    if secrets.is_empty() {
        output::info("No secrets found");
        return Ok(());
    }

    for secret in &secrets {
        println!("  - {}", console::style(&secret.name).cyan());
        if !secret.labels.is_empty() {
            let labels: Vec<String> = secret
                .labels
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("    {} {}", console::style("Labels:").dim(), labels.join(", "));
        }
    }
    Ok(())
}

async fn versions(args: VersionsArgs, config: &SakitConfig) -> Result<()> {
    let client = client(&args.project, config).await?;
    banner(&client);

    let versions = client
        .list_secret_versions(&args.secret)
        .await
        .with_context(|| format!("Failed to list versions of '{}'", args.secret))?;

    output::section(&format!("Versions of secret '{}'", args.secret));
    println!("{:<10} {:<15} {:<30}", "Version", "State", "Created");
    println!("{}", "─".repeat(60));
    for version in &versions {
        let created = version
            .create_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<15} {:<30}",
            version.version,
            version.state.to_string(),
            created
        );
    }
    Ok(())
}

async fn demo(args: DemoArgs, config: &SakitConfig) -> Result<()> {
    let client = client(&args.project, config).await?;
    banner(&client);

    example_service_account_key(&client).await;
    example_api_key(&client).await;
    example_database_url(&client).await;
    example_specific_version(&client).await;
    let cache = match args.cache_ttl {
        Some(secs) => SecretCache::new(Duration::from_secs(secs)),
        None => SecretCache::from_config(&config.secrets.cache),
    };
    example_caching(client, cache).await;

    println!();
    output::header("Examples complete!");
    Ok(())
}

/// Print an example failure without aborting the walk-through
fn example_failed(err: SecretError) {
    output::error(&format!("Error: {}", err));
    output::hints(&err.hints());
}

async fn example_service_account_key(client: &SecretManagerClient) {
    output::section("Example 1: Service Account Key");

    let result = async {
        let secret = SecretRef::latest(SA_KEY_SECRET)?;
        let value = client.access_secret_version(&secret).await?;
        value
            .to_json()
            .map_err(|e| SecretError::invalid_payload(e.to_string()))
    }
    .await;

    match result {
        Ok(key) => {
            let field = |name: &str| key[name].as_str().unwrap_or("-").to_string();
            output::success("Service account key retrieved");
            output::kv("Email", &field("client_email"));
            output::kv("Project", &field("project_id"));
            output::kv("Key ID", &field("private_key_id"));
        }
        Err(e) => example_failed(e),
    }
}

async fn example_api_key(client: &SecretManagerClient) {
    output::section("Example 2: API Key");

    let result = async {
        client
            .access_secret_version(&SecretRef::latest(API_KEY_SECRET)?)
            .await
    }
    .await;

    match result {
        Ok(key) => {
            output::success("API key retrieved");
            output::kv("Length", &format!("{} characters", key.len()));
            output::kv("Preview", &key.preview());
        }
        Err(e) => example_failed(e),
    }
}

async fn example_database_url(client: &SecretManagerClient) {
    output::section("Example 3: Database Connection String");

    let result = async {
        let url = client
            .access_secret_version(&SecretRef::latest(DB_URL_SECRET)?)
            .await?;
        ConnectionInfo::parse(DB_URL_SECRET, &url)
    }
    .await;

    match result {
        Ok(info) => {
            output::success("Database URL retrieved");
            output::kv("Protocol", &info.protocol);
            if let Some(host) = &info.host {
                output::kv("Host", host);
            }
            if let Some(db) = &info.database {
                output::kv("Database", db);
            }
        }
        Err(e) => example_failed(e),
    }
}

async fn example_specific_version(client: &SecretManagerClient) {
    output::section("Example 4: Specific Version Access");

    let result = async {
        println!("\nAccessing version 1...");
        let v1 = client
            .access_secret_version(&SecretRef::new(API_KEY_SECRET, SecretVersion::Number(1))?)
            .await?;
        output::success(&format!("Version 1 retrieved: {}", v1.preview()));

        println!("\nAccessing latest version...");
        let latest = client
            .access_secret_version(&SecretRef::latest(API_KEY_SECRET)?)
            .await?;
        output::success(&format!("Latest version retrieved: {}", latest.preview()));
        Ok::<_, SecretError>(v1 == latest)
    }
    .await;

    match result {
        Ok(true) => output::info("Version 1 is the latest version"),
        Ok(false) => output::info("Version 1 differs from latest version"),
        Err(e) => example_failed(e),
    }
}

async fn example_caching(client: SecretManagerClient, cache: SecretCache) {
    output::section("Example 5: Caching for Performance");

    let enabled = cache.is_enabled();
    let ttl = cache.ttl();
    let cached = CachedSecretClient::new(client, cache);
    let result = async {
        let secret = SecretRef::latest(API_KEY_SECRET)?;

        println!("First access (cache miss):");
        let started = Instant::now();
        let first = cached.fetch(&secret).await?;
        output::kv("Retrieved", &first.preview());
        output::kv("Took", &format!("{:?}", started.elapsed()));

        println!("\nSecond access (cache hit):");
        let started = Instant::now();
        let second = cached.fetch(&secret).await?;
        output::kv("Retrieved", &second.preview());
        output::kv("Took", &format!("{:?}", started.elapsed()));
        Ok::<_, SecretError>(())
    }
    .await;

    match result {
        Ok(()) => {
            let stats = cached.stats().await;
            println!();
            if enabled {
                output::success("Caching improves performance for frequently accessed secrets");
                output::info(&format!(
                    "Cache TTL: {} seconds ({} hits, {} misses)",
                    ttl.as_secs(),
                    stats.hits,
                    stats.misses
                ));
            } else {
                output::info("Caching is disabled in configuration; every access was fetched");
            }
        }
        Err(e) => example_failed(e),
    }
}
