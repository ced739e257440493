use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "cherry-bot")]
#[command(about = "Backport and auto-merge automation for GitHub pull requests")]
#[command(long_about = "cherry-bot turns backport labels and comment commands into cherry-pick \
                       submissions, and ready labels or /merge commands into queued auto-merge \
                       intents. Deliveries are fed in as saved webhook payloads with 'cherry-bot replay'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a saved webhook delivery through the bot
    Replay {
        /// Delivery kind, as sent in the X-GitHub-Event header
        #[arg(long, help = "Event name: pull_request or issue_comment")]
        event: String,
        /// File holding the JSON payload
        #[arg(long)]
        payload: PathBuf,
    },
    /// Fetch a pull request and record its labels, merge and backport state
    Sync {
        /// Pull request number
        number: u64,
        /// Repository owner (defaults to github.owner)
        #[arg(long)]
        owner: Option<String>,
        /// Repository name (defaults to github.repo)
        #[arg(long)]
        repo: Option<String>,
    },
    /// Show the backport target each label resolves to
    ParseLabel {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// Write the default configuration as TOML
    InitConfig {
        #[arg(long, default_value = "cherry-bot.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
