use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::BotConfig;

pub struct InitConfigCommand {
    pub path: PathBuf,
    pub force: bool,
}

impl InitConfigCommand {
    pub fn new(path: PathBuf, force: bool) -> Self {
        Self { path, force }
    }

    pub async fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists; pass --force to overwrite it",
                self.path.display()
            );
        }

        BotConfig::default()
            .save_to_file(&self.path)
            .with_context(|| format!("write {}", self.path.display()))?;

        println!("✅ Wrote default configuration to {}", self.path.display());
        println!("   → Set CHERRY_BOT_GITHUB__TOKEN or GITHUB_TOKEN before replaying deliveries");
        Ok(())
    }
}
