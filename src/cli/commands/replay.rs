use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use super::with_bot;
use crate::config::BotConfig;
use crate::webhook::EventKind;

pub struct ReplayCommand {
    pub event: String,
    pub payload: PathBuf,
}

impl ReplayCommand {
    pub fn new(event: String, payload: PathBuf) -> Self {
        Self { event, payload }
    }

    pub async fn execute(&self, config: &BotConfig) -> Result<()> {
        let kind = EventKind::from_header(&self.event);
        if let EventKind::Other(name) = &kind {
            anyhow::bail!("unsupported event kind {name:?}; expected pull_request or issue_comment");
        }

        let payload = tokio::fs::read(&self.payload)
            .await
            .with_context(|| format!("read payload {}", self.payload.display()))?;

        with_bot(config, |bot| async move {
            bot.handle_delivery(kind, &payload).await;
            Ok(())
        })
        .await?;

        info!(event = %self.event, payload = %self.payload.display(), "delivery replayed");
        println!("✅ Replayed {} delivery from {}", self.event, self.payload.display());
        Ok(())
    }
}
