//! zenex - Zendesk ticket search and export
//!
//! # Configuration
//!
//! Set the following environment variables (or use a `.env` file):
//!
//! - `ZD_EMAIL`: Agent email
//! - `ZD_TOKEN`: API token
//! - `ZD_SUBDOMAIN`: Account subdomain (`acme` for `acme.zendesk.com`)
//!
//! # Usage
//!
//! ```bash
//! zenex export "status:closed created>2024-01-01" --output downloads/closed.csv
//! zenex show users 900120880703
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use zenex::cli::{self, Cli};
use zenex::config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    // Load .env file if present (ignore errors if not found)
    dotenvy::dotenv().ok();

    // Logs go to stderr so JSON output on stdout stays clean
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("zenex=info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting zenex v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::debug!(base_url = %config.base_url, "Configuration loaded");

    cli::run(args, config).await
}
