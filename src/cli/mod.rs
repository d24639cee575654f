//! CLI module for Homefix
//!
//! Provides commands:
//! - `serve`: Run the HTTP server (default)
//! - `diagnose`: Run one diagnostic round from the terminal

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod diagnose;

/// Homefix home repair diagnosis
#[derive(Parser, Debug)]
#[command(name = "homefix")]
#[command(about = "Home repair diagnosis backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Serve,
    /// Diagnose a problem and print the result as JSON
    Diagnose {
        /// Free-text problem description
        #[arg(short, long)]
        description: String,
        /// Photo to attach (repeatable, up to 4)
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
        /// Earlier question and answer as `question=answer`; an empty answer counts as skipped
        #[arg(long = "history")]
        history: Vec<String>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) | None => crate::server::run().await,
        Some(Commands::Diagnose {
            description,
            images,
            history,
        }) => diagnose::run(description, images, history).await,
    }
}
