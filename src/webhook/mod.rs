//! GitHub webhook payloads.
//!
//! Only the fields the handlers read are modelled. Actions are closed enums
//! with an `Other` catch-all so unknown actions deserialize and are ignored
//! explicitly by the routers.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

use crate::github::{PullRequest, RepoRef};

/// Delivery kind, from the `X-GitHub-Event` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    PullRequest,
    IssueComment,
    Other(String),
}

impl EventKind {
    pub fn from_header(name: &str) -> Self {
        match name.trim() {
            "pull_request" => EventKind::PullRequest,
            "issue_comment" => EventKind::IssueComment,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::PullRequest => write!(f, "pull_request"),
            EventKind::IssueComment => write!(f, "issue_comment"),
            EventKind::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Edited,
    Synchronize,
    Labeled,
    Unlabeled,
    Closed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub ref_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: User,
}

impl Repository {
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.owner.login, &self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub base: GitRef,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub pull_request: PullRequestPayload,
    /// Present on `labeled` / `unlabeled`
    #[serde(default)]
    pub label: Option<Label>,
    pub repository: Repository,
    pub sender: User,
}

impl PullRequestEvent {
    pub fn pull_request(&self) -> PullRequest {
        let payload = &self.pull_request;
        PullRequest {
            repo: self.repository.repo_ref(),
            number: payload.number,
            title: payload.title.clone(),
            base: payload.base.ref_name.clone(),
            labels: payload.labels.iter().map(|label| label.name.clone()).collect(),
            merged_at: payload.merged_at,
            author: payload.user.login.clone(),
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        self.label.as_ref().map(|label| label.name.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub user: User,
    /// Set only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub body: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueCommentEvent {
    pub action: IssueCommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: User,
}

impl IssueCommentEvent {
    pub fn is_on_pull_request(&self) -> bool {
        self.issue.pull_request.is_some()
    }

    /// Whether the commenter opened the issue / PR being commented on
    pub fn commenter_is_author(&self) -> bool {
        self.issue.user.login == self.comment.user.login
    }
}
