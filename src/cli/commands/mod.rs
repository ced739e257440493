use anyhow::Result;

use crate::bot::{connect, Bot};
use crate::config::BotConfig;

pub mod init_config;
pub mod parse_label;
pub mod replay;
pub mod sync;

pub use init_config::InitConfigCommand;
pub use parse_label::ParseLabelCommand;
pub use replay::ReplayCommand;
pub use sync::SyncCommand;

/// Build a bot wired to GitHub and the configured state store
pub async fn with_bot<F, Fut, R>(config: &BotConfig, f: F) -> Result<R>
where
    F: FnOnce(Bot) -> Fut,
    Fut: std::future::Future<Output = Result<R>>,
{
    let (collaborators, _state) = connect(config).await?;
    f(Bot::new(config, collaborators)).await
}
