//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use crate::commands::credentials::CredentialsCommands;
pub use crate::commands::files::FilesArgs;
pub use crate::commands::secrets::SecretsCommands;
pub use crate::commands::upload::UploadArgs;

/// sakit - Cloud Storage and Secret Manager from a service account identity
#[derive(Parser, Debug)]
#[command(name = "sakit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to sakit.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Service account credential checks
    #[command(subcommand)]
    Credentials(CredentialsCommands),

    /// Upload a file or test content to a bucket
    Upload(UploadArgs),

    /// Secret Manager access
    #[command(subcommand)]
    Secrets(SecretsCommands),

    /// Read secrets mounted as files by the CSI driver
    Files(FilesArgs),
}

/// Project selection shared by Secret Manager commands
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// GCP project ID (overrides config and SAKIT_PROJECT)
    #[arg(short, long)]
    pub project: Option<String>,
}
