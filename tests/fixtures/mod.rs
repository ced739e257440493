// Recording fakes for driving the bot end to end without GitHub.
//
// GitHub and the cherry-pick runner are faked; the state store, merge policy
// and acknowledgement queue are the real implementations.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use cherry_bot::auto_merge::{CommentingMergeQueue, LabelMergePolicy};
use cherry_bot::cherry_pick::BackportTarget;
use cherry_bot::config::BotConfig;
use cherry_bot::executor::CherryPickError;
use cherry_bot::github::{GitHubError, PullRequest, RepoRef};
use cherry_bot::state::StateStore;
use cherry_bot::traits::{CherryPickExecutor, Collaborators, CommentStore, Membership, PullRequestStore};
use cherry_bot::Bot;

pub const OWNER: &str = "pingcap";
pub const REPO: &str = "tidb";

pub fn repo() -> RepoRef {
    RepoRef::new(OWNER, REPO)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub number: u64,
    pub branch: String,
    pub version: String,
    pub manual: bool,
}

#[derive(Default)]
pub struct FakeGitHub {
    pulls: Mutex<HashMap<u64, PullRequest>>,
    members: Mutex<HashSet<String>>,
    collaborators: Mutex<HashSet<String>>,
    comments: Mutex<Vec<(u64, String)>>,
    applied_labels: Mutex<Vec<(u64, String)>>,
    invitations: Mutex<Vec<String>>,
}

impl FakeGitHub {
    pub fn add_member(&self, login: &str) {
        self.members.lock().unwrap().insert(login.to_string());
    }

    pub fn add_collaborator(&self, login: &str) {
        self.collaborators.lock().unwrap().insert(login.to_string());
    }

    pub fn put_pull(&self, pr: PullRequest) {
        self.pulls.lock().unwrap().insert(pr.number, pr);
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        self.comments.lock().unwrap().clone()
    }

    pub fn applied_labels(&self) -> Vec<(u64, String)> {
        self.applied_labels.lock().unwrap().clone()
    }

    pub fn invitations(&self) -> Vec<String> {
        self.invitations.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestStore for FakeGitHub {
    async fn get(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GitHubError> {
        self.pulls
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| GitHubError::InvalidResponse(format!("{repo}#{number} not found")))
    }

    async fn apply_label(&self, _repo: &RepoRef, number: u64, label: &str) -> Result<(), GitHubError> {
        self.applied_labels
            .lock()
            .unwrap()
            .push((number, label.to_string()));
        if let Some(pr) = self.pulls.lock().unwrap().get_mut(&number) {
            if !pr.has_label(label) {
                pr.labels.push(label.to_string());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, _repo: &RepoRef, number: u64, label: &str) -> Result<(), GitHubError> {
        if let Some(pr) = self.pulls.lock().unwrap().get_mut(&number) {
            pr.labels.retain(|name| name != label);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for FakeGitHub {
    async fn create(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<(), GitHubError> {
        self.comments.lock().unwrap().push((number, body.to_string()));
        Ok(())
    }
}

#[async_trait]
impl Membership for FakeGitHub {
    async fn is_member(&self, login: &str) -> bool {
        self.members.lock().unwrap().contains(login)
    }

    async fn invite_if_not_collaborator(&self, login: &str, _pr: &PullRequest) -> Result<(), GitHubError> {
        if self.collaborators.lock().unwrap().insert(login.to_string()) {
            self.invitations.lock().unwrap().push(login.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingExecutor {
    submissions: Mutex<Vec<Submission>>,
    failing_branches: Mutex<HashSet<String>>,
}

impl RecordingExecutor {
    pub fn fail_on(&self, branch: &str) {
        self.failing_branches.lock().unwrap().insert(branch.to_string());
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn branches(&self) -> Vec<String> {
        self.submissions().into_iter().map(|s| s.branch).collect()
    }
}

#[async_trait]
impl CherryPickExecutor for RecordingExecutor {
    async fn submit(&self, pr: &PullRequest, target: &BackportTarget, manual: bool) -> Result<(), CherryPickError> {
        self.submissions.lock().unwrap().push(Submission {
            number: pr.number,
            branch: target.branch.clone(),
            version: target.version.clone(),
            manual,
        });
        if self.failing_branches.lock().unwrap().contains(&target.branch) {
            return Err(CherryPickError::Rejected {
                branch: target.branch.clone(),
                reason: "merge conflict".to_string(),
            });
        }
        Ok(())
    }
}

pub struct World {
    pub config: BotConfig,
    pub github: Arc<FakeGitHub>,
    pub executor: Arc<RecordingExecutor>,
    pub state: Arc<StateStore>,
}

impl World {
    /// `bob` and `carol` are organization members; `bob` is whitelisted for
    /// release branches and `carol` is a primary-branch committer.
    pub fn new() -> Self {
        let mut config = BotConfig::default();
        config.auto_merge.whitelist = vec!["bob".to_string()];
        config.auto_merge.master_policy.committers = vec!["carol".to_string()];

        let github = Arc::new(FakeGitHub::default());
        github.add_member("bob");
        github.add_member("carol");

        Self {
            config,
            github,
            executor: Arc::new(RecordingExecutor::default()),
            state: Arc::new(StateStore::in_memory()),
        }
    }

    pub fn bot(&self) -> Bot {
        let collaborators = Collaborators {
            pulls: self.github.clone(),
            comments: self.github.clone(),
            membership: self.github.clone(),
            executor: self.executor.clone(),
            policy: Arc::new(LabelMergePolicy::new(&self.config.auto_merge.master_policy)),
            intents: self.state.clone(),
            queue: Arc::new(CommentingMergeQueue::new(
                self.github.clone(),
                self.config.auto_merge.acknowledgement.clone(),
            )),
            bookkeeping: self.state.clone(),
        };
        Bot::new(&self.config, collaborators)
    }
}

pub fn pull_request(number: u64, title: &str, base: &str, labels: &[&str], merged: bool) -> PullRequest {
    PullRequest {
        repo: repo(),
        number,
        title: title.to_string(),
        base: base.to_string(),
        labels: labels.iter().map(|s| s.to_string()).collect(),
        merged_at: merged.then(chrono::Utc::now),
        author: "alice".to_string(),
    }
}

fn repository() -> Value {
    json!({ "name": REPO, "owner": { "login": OWNER } })
}

fn pull_request_json(pr: &PullRequest) -> Value {
    json!({
        "number": pr.number,
        "title": pr.title,
        "base": { "ref": pr.base },
        "labels": pr.labels.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
        "merged_at": pr.merged_at,
        "user": { "login": pr.author }
    })
}

pub fn pull_request_payload(action: &str, pr: &PullRequest, label: Option<&str>, sender: &str) -> Value {
    json!({
        "action": action,
        "number": pr.number,
        "label": label.map(|name| json!({ "name": name })),
        "pull_request": pull_request_json(pr),
        "repository": repository(),
        "sender": { "login": sender }
    })
}

pub fn issue_comment_payload(action: &str, number: u64, body: &str, sender: &str, issue_author: &str) -> Value {
    json!({
        "action": action,
        "issue": {
            "number": number,
            "user": { "login": issue_author },
            "pull_request": { "url": format!("https://api.github.com/repos/{OWNER}/{REPO}/pulls/{number}") }
        },
        "comment": { "body": body, "user": { "login": sender } },
        "repository": repository(),
        "sender": { "login": sender }
    })
}
