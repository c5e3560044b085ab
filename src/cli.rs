use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "arbordoc")]
#[command(about = "Bottom-up LLM analysis for file trees")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a starter config file and prompt templates
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Analyze a file tree bottom-up
    Analyze {
        /// Root directory to analyze (overrides the configured root)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Report output path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Enter file analyses interactively instead of calling the LLM
        #[arg(long)]
        manual: bool,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => engine.init(path).await,
            Commands::Analyze {
                source,
                output,
                manual,
            } => engine.analyze(source, output, manual).await,
        }
    }
}
