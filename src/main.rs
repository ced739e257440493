use anyhow::Result;
use clap::Parser;

use cherry_bot::cli::commands::{InitConfigCommand, ParseLabelCommand, ReplayCommand, SyncCommand};
use cherry_bot::cli::{Cli, Commands};
use cherry_bot::config::BotConfig;
use cherry_bot::telemetry::init_telemetry;

/// Load configuration and start logging for commands that act on it
fn load_config() -> Result<BotConfig> {
    BotConfig::load_env_file()?;
    let config = BotConfig::load()?;
    init_telemetry(&config.observability.log_level)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { event, payload } => {
            ReplayCommand::new(event, payload).execute(&load_config()?).await
        }
        Commands::Sync { number, owner, repo } => {
            SyncCommand::new(number, owner, repo).execute(&load_config()?).await
        }
        Commands::ParseLabel { labels } => {
            ParseLabelCommand::new(labels).execute(&load_config()?).await
        }
        // Must work even when the existing file no longer parses
        Commands::InitConfig { path, force } => InitConfigCommand::new(path, force).execute().await,
    }
}
