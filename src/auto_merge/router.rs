use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use super::intent::{AutoMergeIntent, SaveOutcome};
use super::permission::PermissionEvaluator;
use crate::commands::Command;
use crate::config::{AutoMergeConfig, GitHubConfig};
use crate::github::PullRequest;
use crate::telemetry::report;
use crate::traits::{
    Collaborators, CommentStore, IntentStore, Membership, MergeQueue, PullRequestStore,
};
use crate::webhook::{IssueCommentAction, IssueCommentEvent, PullRequestAction, PullRequestEvent};

/// Turns ready labels and merge commands into queued auto-merge intents
pub struct AutoMergeRouter {
    bot_login: String,
    ready_label: String,
    permissions: PermissionEvaluator,
    pulls: Arc<dyn PullRequestStore>,
    comments: Arc<dyn CommentStore>,
    membership: Arc<dyn Membership>,
    intents: Arc<dyn IntentStore>,
    queue: Arc<dyn MergeQueue>,
}

impl AutoMergeRouter {
    pub fn new(
        github: &GitHubConfig,
        config: &AutoMergeConfig,
        collaborators: &Collaborators,
    ) -> Self {
        Self {
            bot_login: github.bot_login.clone(),
            ready_label: config.ready_label.clone(),
            permissions: PermissionEvaluator::new(config, collaborators.policy.clone()),
            pulls: collaborators.pulls.clone(),
            comments: collaborators.comments.clone(),
            membership: collaborators.membership.clone(),
            intents: collaborators.intents.clone(),
            queue: collaborators.queue.clone(),
        }
    }

    pub async fn on_pull_request_event(&self, event: &PullRequestEvent) {
        if event.sender.login == self.bot_login {
            debug!("ignoring event sent by the bot itself");
            return;
        }

        let is_ready_label = event.action == PullRequestAction::Labeled
            && event.label_name() == Some(self.ready_label.as_str());
        if !is_ready_label {
            return;
        }

        if let Err(err) = self.handle_ready_label(event).await {
            report(&err);
        }
    }

    async fn handle_ready_label(&self, event: &PullRequestEvent) -> Result<()> {
        let pr = event.pull_request();
        if !self.authorize(&event.sender.login, &pr).await? {
            return Ok(());
        }
        self.enqueue(&pr).await
    }

    pub async fn on_issue_comment_event(&self, event: &IssueCommentEvent) {
        if event.action != IssueCommentAction::Created {
            return;
        }
        if !Command::recognize(&event.comment.body).is_auto_merge() {
            return;
        }

        if let Err(err) = self.handle_merge_command(event).await {
            report(&err);
        }
    }

    async fn handle_merge_command(&self, event: &IssueCommentEvent) -> Result<()> {
        let login = event.sender.login.as_str();
        if !self.membership.is_member(login).await {
            debug!(login, "merge command from non-member ignored");
            return Ok(());
        }

        let repo = event.repository.repo_ref();
        let number = event.issue.number;
        let pr = self
            .pulls
            .get(&repo, number)
            .await
            .with_context(|| format!("get pull request {repo}#{number}"))?;

        if !self.authorize(login, &pr).await? {
            return Ok(());
        }

        if let Err(err) = self
            .pulls
            .apply_label(&pr.repo, pr.number, &self.ready_label)
            .await
            .with_context(|| format!("apply {:?} to {pr}", self.ready_label))
        {
            report(&err);
        }

        self.enqueue(&pr).await
    }

    /// Evaluate permission and post the reason on denial.
    ///
    /// `Ok(false)` means denied and already answered.
    async fn authorize(&self, login: &str, pr: &PullRequest) -> Result<bool> {
        let decision = self.permissions.can_auto_merge(login, pr).await;
        if decision.allowed {
            return Ok(true);
        }

        info!(pr = %pr, login, "auto merge denied");
        self.comments
            .create(&pr.repo, pr.number, &decision.reason)
            .await
            .with_context(|| format!("post permission denial on {pr}"))?;
        Ok(false)
    }

    /// Upsert the pending intent; only a newly created one is acknowledged
    async fn enqueue(&self, pr: &PullRequest) -> Result<()> {
        let intent = AutoMergeIntent::pending(pr, Utc::now());
        let outcome = self
            .intents
            .save(&intent)
            .await
            .with_context(|| format!("save auto merge intent for {pr}"))?;

        match outcome {
            SaveOutcome::Created => {
                info!(pr = %pr, base = %pr.base, "auto merge queued");
                self.queue
                    .enqueue_acknowledgement(pr)
                    .await
                    .with_context(|| format!("acknowledge auto merge of {pr}"))
            }
            SaveOutcome::AlreadyPending => {
                debug!(pr = %pr, "auto merge already pending");
                Ok(())
            }
        }
    }
}
