// cherry-bot library: webhook handling for backports and auto-merge.
// The binary is a thin CLI over these components.

pub mod auto_merge;
pub mod bot;
pub mod cherry_pick;
pub mod cli;
pub mod commands;
pub mod config;
pub mod executor;
pub mod github;
pub mod state;
pub mod telemetry;
pub mod traits;
pub mod webhook;

// Re-export key types for easy access
pub use auto_merge::{AutoMergeIntent, AutoMergeRouter, IntentStatus, PermissionDecision, PermissionEvaluator, SaveOutcome};
pub use bot::{connect, Bot};
pub use cherry_pick::{BackportTarget, CherryPickDispatcher, CherryPickRouter, DispatchReport, LabelParser};
pub use commands::Command;
pub use config::BotConfig;
pub use executor::{CherryPickError, CommandCherryPickExecutor};
pub use github::{GitHubClient, GitHubError, PullRequest, RepoRef};
pub use state::{PersistenceError, StateStore};
pub use telemetry::{create_delivery_span, generate_correlation_id, init_telemetry};
pub use traits::Collaborators;
pub use webhook::{EventKind, IssueCommentEvent, PullRequestEvent};
