use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for cherry-bot
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BotConfig {
    /// GitHub configuration
    pub github: GitHubConfig,
    /// Backport label conventions and the cherry-pick runner
    pub cherry_pick: CherryPickConfig,
    /// Auto-merge permission rules
    pub auto_merge: AutoMergeConfig,
    /// Bookkeeping and intent persistence
    pub state: StateConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// Default repository owner, used when replaying deliveries
    pub owner: String,
    /// Default repository name
    pub repo: String,
    /// Organization whose members may run commands; falls back to `owner`
    pub org: Option<String>,
    /// Login the bot acts as. Events sent by this login are ignored.
    pub bot_login: String,
    /// How long an organization membership answer is reused
    pub membership_cache_ttl_seconds: u64,
    /// Rate limiting settings
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CherryPickConfig {
    /// Label prefixes that mark a backport request (`release-5.0`)
    pub label_prefixes: Vec<String>,
    /// Review/approval label prefixes never treated as backport labels
    pub status_prefixes: Vec<String>,
    /// Prefix of the release branch a version resolves to
    pub branch_prefix: String,
    /// Program that performs the actual cherry-pick
    pub executor_program: String,
    /// Arguments passed before the per-request ones
    pub executor_args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AutoMergeConfig {
    /// Label that marks a PR as ready to auto-merge
    pub ready_label: String,
    /// Primary integration branch guarded by the master policy
    pub primary_branch: String,
    /// Logins allowed to auto-merge into non-primary branches
    pub whitelist: Vec<String>,
    /// Comment posted when a PR joins the merge queue
    pub acknowledgement: String,
    /// Rules for merging into the primary branch
    pub master_policy: MasterPolicyConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MasterPolicyConfig {
    /// Labels that must all be present before merging to the primary branch
    pub required_labels: Vec<String>,
    /// Logins allowed to trigger auto-merge on the primary branch
    pub committers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    /// JSON file holding bookkeeping and intents; in-memory when unset
    pub path: Option<String>,
    /// Finished records older than this are pruned at startup; unset keeps everything
    pub retention_days: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None, // Will be read from env var
            owner: "pingcap".to_string(),
            repo: "tidb".to_string(),
            org: None,
            bot_login: "ti-srebot".to_string(),
            membership_cache_ttl_seconds: 300,
            rate_limit: RateLimitConfig {
                requests_per_second: 1,
                burst_capacity: 10,
            },
        }
    }
}

impl GitHubConfig {
    pub fn org(&self) -> &str {
        self.org.as_deref().unwrap_or(&self.owner)
    }
}

impl Default for CherryPickConfig {
    fn default() -> Self {
        Self {
            label_prefixes: vec!["release-".to_string(), "needs-cherry-pick-".to_string()],
            status_prefixes: vec!["LGT".to_string(), "status/".to_string()],
            branch_prefix: "release-".to_string(),
            executor_program: "cherry-picker".to_string(),
            executor_args: Vec::new(),
        }
    }
}

impl Default for AutoMergeConfig {
    fn default() -> Self {
        Self {
            ready_label: "can merge".to_string(),
            primary_branch: "master".to_string(),
            whitelist: Vec::new(),
            acknowledgement: "Your auto merge job has been accepted, waiting for the PR to be merged."
                .to_string(),
            master_policy: MasterPolicyConfig {
                required_labels: vec!["LGT2".to_string()],
                committers: Vec::new(),
            },
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: None,
            retention_days: Some(90),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl BotConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (cherry-bot.toml)
    /// 3. Environment variables (prefixed with CHERRY_BOT_, nested with `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("cherry-bot.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&BotConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("CHERRY_BOT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("auto_merge.whitelist")
                .with_list_parse_key("auto_merge.master_policy.committers")
                .with_list_parse_key("auto_merge.master_policy.required_labels")
                .with_list_parse_key("cherry_pick.label_prefixes")
                .with_list_parse_key("cherry_pick.status_prefixes")
                .try_parsing(true),
        );

        let mut bot_config: BotConfig = builder.build()?.try_deserialize()?;

        if bot_config.github.token.is_none() {
            if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                bot_config.github.token = Some(token);
            }
        }

        Ok(bot_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
