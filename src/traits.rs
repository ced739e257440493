// Collaborator seams the webhook handlers are written against.
//
// Everything that leaves the process (GitHub, the cherry-pick runner, the
// state store) sits behind one of these traits so handlers can be driven by
// mocks in tests.

use async_trait::async_trait;
use std::sync::Arc;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::auto_merge::intent::{AutoMergeIntent, SaveOutcome};
use crate::auto_merge::policy::PolicyDenial;
use crate::cherry_pick::labels::BackportTarget;
use crate::executor::CherryPickError;
use crate::github::{GitHubError, PullRequest, RepoRef};
use crate::state::PersistenceError;

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    async fn get(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GitHubError>;

    async fn apply_label(&self, repo: &RepoRef, number: u64, label: &str)
        -> Result<(), GitHubError>;

    /// Removing a label the PR does not carry is not an error
    async fn remove_label(
        &self,
        repo: &RepoRef,
        number: u64,
        label: &str,
    ) -> Result<(), GitHubError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, repo: &RepoRef, number: u64, body: &str) -> Result<(), GitHubError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Membership: Send + Sync {
    /// Organization membership; lookup failures count as "not a member"
    async fn is_member(&self, login: &str) -> bool;

    /// Idempotent: a login that already collaborates is left alone
    async fn invite_if_not_collaborator(
        &self,
        login: &str,
        pr: &PullRequest,
    ) -> Result<(), GitHubError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CherryPickExecutor: Send + Sync {
    async fn submit(
        &self,
        pr: &PullRequest,
        target: &BackportTarget,
        manual: bool,
    ) -> Result<(), CherryPickError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MergePolicy: Send + Sync {
    /// `Ok(())` allows the merge; the denial carries the user-facing reason
    async fn can_merge_to_master(
        &self,
        repo: &RepoRef,
        labels: &[String],
        login: &str,
    ) -> Result<(), PolicyDenial>;
}

/// Upsert keyed by `(owner, repo, pr_number)`
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait IntentStore: Send + Sync {
    async fn save(&self, intent: &AutoMergeIntent) -> Result<SaveOutcome, PersistenceError>;
}

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MergeQueue: Send + Sync {
    async fn enqueue_acknowledgement(&self, pr: &PullRequest) -> Result<(), GitHubError>;
}

/// Derived backport state. Every write is an upsert keyed by
/// `(owner, repo, number[, label])` so duplicate deliveries are harmless.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Bookkeeping: Send + Sync {
    async fn commit_label(&self, pr: &PullRequest, label: &str) -> Result<(), PersistenceError>;

    async fn remove_label(&self, pr: &PullRequest, label: &str) -> Result<(), PersistenceError>;

    async fn commit_merge(&self, pr: &PullRequest) -> Result<(), PersistenceError>;

    /// Track a PR that is itself a backport commit
    async fn create_cherry_pick(&self, pr: &PullRequest) -> Result<(), PersistenceError>;
}

/// The full set of collaborators a bot instance talks to
#[derive(Clone)]
pub struct Collaborators {
    pub pulls: Arc<dyn PullRequestStore>,
    pub comments: Arc<dyn CommentStore>,
    pub membership: Arc<dyn Membership>,
    pub executor: Arc<dyn CherryPickExecutor>,
    pub policy: Arc<dyn MergePolicy>,
    pub intents: Arc<dyn IntentStore>,
    pub queue: Arc<dyn MergeQueue>,
    pub bookkeeping: Arc<dyn Bookkeeping>,
}
