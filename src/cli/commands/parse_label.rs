use anyhow::Result;

use crate::cherry_pick::LabelParser;
use crate::config::BotConfig;

pub struct ParseLabelCommand {
    pub labels: Vec<String>,
}

impl ParseLabelCommand {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn render(&self, parser: &LabelParser) -> Vec<String> {
        self.labels
            .iter()
            .map(|label| match parser.parse(label) {
                Some(target) => format!("{label}: {target}"),
                None => format!("{label}: not a backport label"),
            })
            .collect()
    }

    pub async fn execute(&self, config: &BotConfig) -> Result<()> {
        let parser = LabelParser::new(&config.cherry_pick);
        for line in self.render(&parser) {
            println!("{line}");
        }
        Ok(())
    }
}
