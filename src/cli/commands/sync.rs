use anyhow::Result;

use super::with_bot;
use crate::config::BotConfig;
use crate::github::RepoRef;

pub struct SyncCommand {
    pub number: u64,
    pub owner: Option<String>,
    pub repo: Option<String>,
}

impl SyncCommand {
    pub fn new(number: u64, owner: Option<String>, repo: Option<String>) -> Self {
        Self { number, owner, repo }
    }

    fn repo_ref(&self, config: &BotConfig) -> RepoRef {
        RepoRef::new(
            self.owner.as_deref().unwrap_or(&config.github.owner),
            self.repo.as_deref().unwrap_or(&config.github.repo),
        )
    }

    pub async fn execute(&self, config: &BotConfig) -> Result<()> {
        let repo = self.repo_ref(config);
        let number = self.number;

        with_bot(config, |bot| {
            let repo = repo.clone();
            async move { bot.sync_pull_request(&repo, number).await }
        })
        .await?;

        println!("✅ Synced {repo}#{number}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_defaults_come_from_config() {
        let config = BotConfig::default();
        let command = SyncCommand::new(1, None, Some("pd".to_string()));
        assert_eq!(command.repo_ref(&config).to_string(), "pingcap/pd");
    }
}
