use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{PullRequest, RepoRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentStatus {
    Pending,
    Done,
}

/// A queued request to auto-merge a PR.
///
/// Created here as `Pending`; the merge executor flips it to `Done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoMergeIntent {
    pub pr_number: u64,
    pub owner: String,
    pub repo: String,
    pub base_branch: String,
    pub status: IntentStatus,
    pub created_at: DateTime<Utc>,
}

impl AutoMergeIntent {
    pub fn pending(pr: &PullRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            pr_number: pr.number,
            owner: pr.repo.owner.clone(),
            repo: pr.repo.name.clone(),
            base_branch: pr.base.clone(),
            status: IntentStatus::Pending,
            created_at,
        }
    }

    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner, &self.repo)
    }

    pub fn is_pending(&self) -> bool {
        self.status == IntentStatus::Pending
    }
}

/// Result of an intent upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    /// A pending intent for the same PR already existed and was kept
    AlreadyPending,
}
