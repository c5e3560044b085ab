use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod config;
mod error;

use cli::Cli;
use core::Engine;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; --verbose lowers the default level, RUST_LOG
    // directives still override it
    let default_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .init();

    info!("Starting Arbordoc v{}", env!("CARGO_PKG_VERSION"));

    // Create the core engine with configuration
    let engine = Engine::new(cli.config.as_deref()).await?;

    // Execute the requested command
    cli.execute(engine).await
}
