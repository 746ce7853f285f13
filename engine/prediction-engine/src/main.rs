//! # Prediction Engine Binary
//!
//! Command-line front end for single, comparison and ranking predictions.

use anyhow::Result;
use clap::Parser;
use prediction_engine::cli::{Cli, CliHandler};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let handler = CliHandler::new(cli.config.as_deref(), cli.history.as_deref()).await?;
    handler.handle_command(cli.command).await?;

    Ok(())
}
