//! sakit CLI - Cloud Storage and Secret Manager access from a service account
//!
//! This is the main entry point for the sakit command-line interface.

mod cli;
mod commands;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Credentials(cmd) => commands::credentials::run(cmd).await,
        Commands::Upload(args) => commands::upload::run(args, config).await,
        Commands::Secrets(cmd) => commands::secrets::run(cmd, config).await,
        Commands::Files(args) => commands::files::run(args, config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
