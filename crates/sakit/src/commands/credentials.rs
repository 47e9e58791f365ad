//! Credential verification

use anyhow::{Context, Result};
use clap::Subcommand;
use sakit_core::{AccessTokenSource, CredentialSource, GoogleTokenSource, CREDENTIALS_ENV};

use crate::output;

#[derive(Subcommand, Debug)]
pub enum CredentialsCommands {
    /// Resolve credentials, validate the key file and request a token
    Verify,
}

pub async fn run(cmd: CredentialsCommands) -> Result<()> {
    match cmd {
        CredentialsCommands::Verify => verify().await,
    }
}

async fn verify() -> Result<()> {
    output::header("Service Account Credentials");
    println!();

    let source = CredentialSource::from_env()?;
    match source.load_key()? {
        Some(key) => {
            if let Some(path) = source.key_file() {
                output::success(&format!("Using credentials: {}", path.display()));
            }
            output::kv("Service Account", key.client_email());
            output::kv("Project", key.project_id());
            output::kv("Key ID", key.private_key_id());
        }
        None => {
            output::warning(&format!("{} not set", CREDENTIALS_ENV));
            output::info("Will attempt to use Application Default Credentials");
            output::hints(&[
                "To set credentials:".to_string(),
                format!("  export {}=~/demo-uploader-key.json", CREDENTIALS_ENV),
            ]);
        }
    }

    let spinner = output::spinner("Requesting access token...");
    let result = async {
        let tokens = GoogleTokenSource::new(source).await?;
        tokens.access_token().await
    }
    .await;
    spinner.finish_and_clear();

    let token = result.context("Error validating credentials")?;
    output::success(&format!(
        "Access token obtained ({} characters)",
        token.len()
    ));
    Ok(())
}
