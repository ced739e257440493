use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, Instrument};

use crate::auto_merge::{AutoMergeRouter, CommentingMergeQueue, LabelMergePolicy};
use crate::cherry_pick::CherryPickRouter;
use crate::config::BotConfig;
use crate::executor::CommandCherryPickExecutor;
use crate::github::{GitHubClient, RepoRef};
use crate::state::StateStore;
use crate::telemetry::{create_delivery_span, generate_correlation_id, report};
use crate::traits::{Collaborators, PullRequestStore};
use crate::webhook::{EventKind, IssueCommentEvent, PullRequestEvent};

/// Production collaborators: GitHub over REST, the JSON state store and the
/// external cherry-pick program.
pub async fn connect(config: &BotConfig) -> Result<(Collaborators, Arc<StateStore>)> {
    let github = Arc::new(GitHubClient::new(&config.github).context("create GitHub client")?);

    let state = match &config.state.path {
        Some(path) => StateStore::open(path)
            .await
            .with_context(|| format!("open state store {path}"))?,
        None => StateStore::in_memory(),
    };
    if let Some(cutoff) = config.state.retention_days.and_then(|days| {
        let days = chrono::Duration::try_days(i64::try_from(days).ok()?)?;
        Utc::now().checked_sub_signed(days)
    }) {
        state.prune(cutoff).await.context("prune state store")?;
    }
    let state = Arc::new(state);

    let collaborators = Collaborators {
        pulls: github.clone(),
        comments: github.clone(),
        membership: github.clone(),
        executor: Arc::new(CommandCherryPickExecutor::new(&config.cherry_pick)),
        policy: Arc::new(LabelMergePolicy::new(&config.auto_merge.master_policy)),
        intents: state.clone(),
        queue: Arc::new(CommentingMergeQueue::new(
            github,
            config.auto_merge.acknowledgement.clone(),
        )),
        bookkeeping: state.clone(),
    };

    Ok((collaborators, state))
}

/// Fans every delivery out to the cherry-pick and auto-merge routers
pub struct Bot {
    cherry_pick: CherryPickRouter,
    auto_merge: AutoMergeRouter,
    pulls: Arc<dyn PullRequestStore>,
}

impl Bot {
    pub fn new(config: &BotConfig, collaborators: Collaborators) -> Self {
        Self {
            cherry_pick: CherryPickRouter::new(&config.cherry_pick, &collaborators),
            auto_merge: AutoMergeRouter::new(&config.github, &config.auto_merge, &collaborators),
            pulls: collaborators.pulls,
        }
    }

    /// Decode and route one raw delivery. Malformed payloads are reported
    /// and dropped; unknown kinds are ignored.
    pub async fn handle_delivery(&self, kind: EventKind, payload: &[u8]) {
        let correlation_id = generate_correlation_id();

        match kind {
            EventKind::PullRequest => match serde_json::from_slice::<PullRequestEvent>(payload) {
                Ok(event) => {
                    let span = create_delivery_span(
                        "pull_request",
                        &event.repository.repo_ref().to_string(),
                        event.pull_request.number,
                        &correlation_id,
                    );
                    self.on_pull_request_event(&event).instrument(span).await;
                }
                Err(err) => report(
                    &anyhow::Error::new(err).context("decode pull_request payload"),
                ),
            },
            EventKind::IssueComment => match serde_json::from_slice::<IssueCommentEvent>(payload) {
                Ok(event) => {
                    let span = create_delivery_span(
                        "issue_comment",
                        &event.repository.repo_ref().to_string(),
                        event.issue.number,
                        &correlation_id,
                    );
                    self.on_issue_comment_event(&event).instrument(span).await;
                }
                Err(err) => report(
                    &anyhow::Error::new(err).context("decode issue_comment payload"),
                ),
            },
            EventKind::Other(name) => {
                debug!(event = %name, correlation.id = %correlation_id, "event kind not handled");
            }
        }
    }

    pub async fn on_pull_request_event(&self, event: &PullRequestEvent) {
        self.cherry_pick.on_pull_request_event(event).await;
        self.auto_merge.on_pull_request_event(event).await;
    }

    pub async fn on_issue_comment_event(&self, event: &IssueCommentEvent) {
        self.cherry_pick.on_issue_comment_event(event).await;
        self.auto_merge.on_issue_comment_event(event).await;
    }

    /// Fetch a PR and run the full bookkeeping pass over it
    pub async fn sync_pull_request(&self, repo: &RepoRef, number: u64) -> Result<()> {
        let pr = self
            .pulls
            .get(repo, number)
            .await
            .with_context(|| format!("get pull request {repo}#{number}"))?;
        self.cherry_pick.process_pull_request(&pr).await;
        Ok(())
    }
}
