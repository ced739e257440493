use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repository coordinates (`owner/name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The slice of a pull request the handlers read.
///
/// Built either from a webhook payload or from the REST API. Labels keep the
/// order the platform reported them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub repo: RepoRef,
    pub number: u64,
    pub title: String,
    pub base: String,
    pub labels: Vec<String>,
    pub merged_at: Option<DateTime<Utc>>,
    pub author: String,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|name| name == label)
    }

    /// Convert an octocrab pull request into the domain model
    pub fn from_octocrab(repo: RepoRef, pr: octocrab::models::pulls::PullRequest) -> Self {
        Self {
            repo,
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            base: pr.base.ref_field,
            labels: pr
                .labels
                .unwrap_or_default()
                .into_iter()
                .map(|label| label.name)
                .collect(),
            merged_at: pr.merged_at,
            author: pr.user.map(|user| user.login).unwrap_or_default(),
        }
    }
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PullRequest {
        PullRequest {
            repo: RepoRef::new("pingcap", "tidb"),
            number: 42,
            title: "executor: fix panic".to_string(),
            base: "master".to_string(),
            labels: vec!["release-5.0".to_string(), "LGTM".to_string()],
            merged_at: None,
            author: "alice".to_string(),
        }
    }

    #[test]
    fn test_display_includes_repo_and_number() {
        assert_eq!(sample().to_string(), "pingcap/tidb#42");
        assert_eq!(RepoRef::new("a", "b").to_string(), "a/b");
    }

    #[test]
    fn test_has_label_is_exact() {
        let pr = sample();
        assert!(pr.has_label("LGTM"));
        assert!(!pr.has_label("lgtm"));
        assert!(!pr.is_merged());
    }
}
