//! CLI definition and command handling

pub mod commands;

use clap::{Parser, Subcommand};

use commands::{PreviewCommand, RedeployCommand};

/// Gantry - preview releases for pull requests
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Publish preview builds of changed packages for a pull request
    Preview(PreviewCommand),

    /// Redeploy the most recent healthy deployment of a service
    Redeploy(RedeployCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Preview(ref cmd) => cmd.execute().await,
            Commands::Redeploy(ref cmd) => cmd.execute().await,
        }
    }
}
