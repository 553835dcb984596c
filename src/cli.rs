//! Command-line interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stockroom - users, items and API keys over HTTP
#[derive(Parser)]
#[command(name = "stockroom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Wait for the database to answer, then exit
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Write a default config.toml if none exists
    Init,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}
