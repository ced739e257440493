use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::github::RepoRef;
use crate::traits::{CommentStore, Membership, PullRequestStore};

pub const MEMBERS_ONLY_MESSAGE: &str = "This command can only be used by organization members.";

/// Handles `/cherry-pick-invite`: members get collaborator access to the
/// repository the cherry-pick branches are pushed to.
pub struct InvitationFlow {
    pulls: Arc<dyn PullRequestStore>,
    comments: Arc<dyn CommentStore>,
    membership: Arc<dyn Membership>,
}

impl InvitationFlow {
    pub fn new(
        pulls: Arc<dyn PullRequestStore>,
        comments: Arc<dyn CommentStore>,
        membership: Arc<dyn Membership>,
    ) -> Self {
        Self {
            pulls,
            comments,
            membership,
        }
    }

    pub async fn run(&self, repo: &RepoRef, number: u64, login: &str) -> Result<()> {
        let pr = self
            .pulls
            .get(repo, number)
            .await
            .with_context(|| format!("get pull request {repo}#{number}"))?;

        if !self.membership.is_member(login).await {
            info!(pr = %pr, login, "invite requested by non-member");
            return self
                .comments
                .create(repo, number, MEMBERS_ONLY_MESSAGE)
                .await
                .with_context(|| format!("comment on {pr}"));
        }

        self.membership
            .invite_if_not_collaborator(login, &pr)
            .await
            .with_context(|| format!("invite {login} as collaborator for {pr}"))?;
        info!(pr = %pr, login, "collaborator invitation sent");
        Ok(())
    }
}
