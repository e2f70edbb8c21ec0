//! Main Entrypoint for the Interview CLI
//!
//! This binary is responsible for:
//! 1. Parsing the command line and loading configuration from the environment.
//! 2. Initializing logging on stderr so it never mixes with the interview.
//! 3. Dispatching to the selected command.

use anyhow::Context;
use clap::Parser;
use interview_service::{
    app,
    cli::{Cli, Command},
    config::Config,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_cli(&cli);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!("Configuration loaded.");

    // --- 3. Run the Command ---
    match cli.command {
        Command::Models => app::list_models(&config, &mut std::io::stdout()).await,
        Command::Run(args) => app::run(config, args).await,
    }
}
