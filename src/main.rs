//! Homefix - Home repair diagnosis backend
//!
//! CLI entry point for the Homefix server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod middleware;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so `homefix diagnose` output stays clean JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homefix=info,homefix_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();
    if !matches!(cli.command, Some(cli::Commands::Diagnose { .. })) {
        tracing::info!("Starting Homefix v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli).await
}
