use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::dispatcher::CherryPickDispatcher;
use super::invite::InvitationFlow;
use super::labels::LabelParser;
use crate::commands::Command;
use crate::config::CherryPickConfig;
use crate::github::PullRequest;
use crate::telemetry::report;
use crate::traits::{Bookkeeping, Collaborators, Membership, PullRequestStore};
use crate::webhook::{IssueCommentEvent, PullRequestAction, PullRequestEvent};

/// Routes deliveries to the cherry-pick side of the bot.
///
/// Every entry point returns `()`: failures are reported here and never
/// reach the caller.
pub struct CherryPickRouter {
    dispatcher: CherryPickDispatcher,
    invitation: InvitationFlow,
    pulls: Arc<dyn PullRequestStore>,
    membership: Arc<dyn Membership>,
    bookkeeping: Arc<dyn Bookkeeping>,
}

impl CherryPickRouter {
    pub fn new(config: &CherryPickConfig, collaborators: &Collaborators) -> Self {
        Self {
            dispatcher: CherryPickDispatcher::new(
                LabelParser::new(config),
                collaborators.executor.clone(),
                collaborators.bookkeeping.clone(),
            ),
            invitation: InvitationFlow::new(
                collaborators.pulls.clone(),
                collaborators.comments.clone(),
                collaborators.membership.clone(),
            ),
            pulls: collaborators.pulls.clone(),
            membership: collaborators.membership.clone(),
            bookkeeping: collaborators.bookkeeping.clone(),
        }
    }

    pub fn dispatcher(&self) -> &CherryPickDispatcher {
        &self.dispatcher
    }

    pub async fn on_pull_request_event(&self, event: &PullRequestEvent) {
        if let Err(err) = self.handle_pull_request_event(event).await {
            report(&err);
        }
    }

    async fn handle_pull_request_event(&self, event: &PullRequestEvent) -> Result<()> {
        let pr = event.pull_request();

        match event.action {
            PullRequestAction::Labeled => {
                let Some(label) = event.label_name() else {
                    debug!(pr = %pr, "labeled event without a label");
                    return Ok(());
                };
                self.dispatcher.commit_label(&pr, label).await?;
            }
            PullRequestAction::Unlabeled => {
                let Some(label) = event.label_name() else {
                    debug!(pr = %pr, "unlabeled event without a label");
                    return Ok(());
                };
                self.bookkeeping
                    .remove_label(&pr, label)
                    .await
                    .with_context(|| format!("remove label {label:?} from {pr}"))?;
            }
            PullRequestAction::Closed if pr.is_merged() => {
                info!(pr = %pr, "recording merge of closed pull request");
                self.bookkeeping
                    .commit_merge(&pr)
                    .await
                    .with_context(|| format!("commit merge of {pr}"))?;
            }
            PullRequestAction::Closed => {
                info!(pr = %pr, "pull request closed without merge");
            }
            PullRequestAction::Opened
            | PullRequestAction::Reopened
            | PullRequestAction::Edited
            | PullRequestAction::Synchronize
            | PullRequestAction::Other => {
                debug!(pr = %pr, action = ?event.action, "pull request action ignored");
            }
        }

        Ok(())
    }

    /// Full bookkeeping pass over a PR fetched outside of a delivery
    pub async fn process_pull_request(&self, pr: &PullRequest) {
        let outcome = self.dispatcher.process_pull_request(pr).await;
        for err in &outcome.failures {
            report(err);
        }
        info!(
            pr = %pr,
            backport_commit = outcome.backport_commit,
            labels = outcome.committed_labels.len(),
            merge_recorded = outcome.merge_recorded,
            "pull request processed"
        );
    }

    pub async fn on_issue_comment_event(&self, event: &IssueCommentEvent) {
        if !event.is_on_pull_request() {
            debug!(issue = event.issue.number, "comment is not on a pull request");
            return;
        }

        let result = match Command::recognize(&event.comment.body) {
            Command::CherryPickTrigger => self.run_cherry_picker(event).await,
            Command::CherryPickInvite => {
                self.invitation
                    .run(
                        &event.repository.repo_ref(),
                        event.issue.number,
                        &event.sender.login,
                    )
                    .await
            }
            Command::AutoMerge | Command::AutoMergeAlias | Command::None => Ok(()),
        };

        if let Err(err) = result {
            report(&err);
        }
    }

    async fn run_cherry_picker(&self, event: &IssueCommentEvent) -> Result<()> {
        let repo = event.repository.repo_ref();
        let number = event.issue.number;
        let login = event.sender.login.as_str();

        let eligible = self.membership.is_member(login).await || event.commenter_is_author();
        if !eligible {
            info!(
                pr = %format!("{repo}#{number}"),
                login,
                "sender may not run the cherry-picker"
            );
            return Ok(());
        }

        let pr = self
            .pulls
            .get(&repo, number)
            .await
            .with_context(|| format!("get pull request {repo}#{number}"))?;

        if !pr.is_merged() {
            info!(pr = %pr, "pull request not merged yet, nothing to cherry-pick");
            return Ok(());
        }

        let outcome = self.dispatcher.dispatch(&pr, false).await;
        info!(
            pr = %pr,
            submitted = outcome.submitted.len(),
            skipped = outcome.skipped.len(),
            failed = outcome.failures.len(),
            "cherry-pick command dispatched"
        );
        for failure in outcome.failures {
            report(&failure.into_error(&pr));
        }

        Ok(())
    }
}
