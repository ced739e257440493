use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::config::MasterPolicyConfig;
use crate::github::RepoRef;
use crate::traits::MergePolicy;

/// Why a merge into the primary branch is not allowed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PolicyDenial {
    pub reason: String,
}

impl PolicyDenial {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Primary-branch policy driven by configuration: the sender must be a
/// committer and every sign-off label must already be on the PR.
#[derive(Debug, Clone)]
pub struct LabelMergePolicy {
    committers: HashSet<String>,
    required_labels: Vec<String>,
}

impl LabelMergePolicy {
    pub fn new(config: &MasterPolicyConfig) -> Self {
        Self {
            committers: config.committers.iter().cloned().collect(),
            required_labels: config.required_labels.clone(),
        }
    }
}

#[async_trait]
impl MergePolicy for LabelMergePolicy {
    async fn can_merge_to_master(
        &self,
        _repo: &RepoRef,
        labels: &[String],
        login: &str,
    ) -> Result<(), PolicyDenial> {
        if !self.committers.contains(login) {
            return Err(PolicyDenial::new(format!(
                "Only committers can merge into the main branch, and @{login} is not one of them."
            )));
        }

        let missing: Vec<&str> = self
            .required_labels
            .iter()
            .filter(|required| !labels.contains(required))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(PolicyDenial::new(format!(
                "Required labels are missing: {}.",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}
