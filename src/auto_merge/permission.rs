use std::collections::HashSet;
use std::sync::Arc;

use crate::config::AutoMergeConfig;
use crate::github::PullRequest;
use crate::traits::MergePolicy;

/// Outcome of an auto-merge permission check.
///
/// `reason` is addressed to the sender and is posted verbatim by the caller
/// when `allowed` is false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDecision {
    pub allowed: bool,
    pub reason: String,
}

impl PermissionDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

pub fn no_access_message(login: &str) -> String {
    format!("Sorry @{login}, you don't have permission to trigger auto merge event on this branch.")
}

/// Decides who may trigger auto-merge on which base branch.
///
/// The primary branch defers to the master merge policy; every other branch
/// is open to the configured whitelist. Nothing is posted from here.
pub struct PermissionEvaluator {
    primary_branch: String,
    whitelist: HashSet<String>,
    policy: Arc<dyn MergePolicy>,
}

impl PermissionEvaluator {
    pub fn new(config: &AutoMergeConfig, policy: Arc<dyn MergePolicy>) -> Self {
        Self {
            primary_branch: config.primary_branch.clone(),
            whitelist: config.whitelist.iter().cloned().collect(),
            policy,
        }
    }

    pub async fn can_auto_merge(&self, login: &str, pr: &PullRequest) -> PermissionDecision {
        if pr.base == self.primary_branch {
            return match self
                .policy
                .can_merge_to_master(&pr.repo, &pr.labels, login)
                .await
            {
                Ok(()) => PermissionDecision::allow(),
                Err(denial) => {
                    PermissionDecision::deny(format!("{} {}", no_access_message(login), denial))
                }
            };
        }

        if self.whitelist.contains(login) {
            PermissionDecision::allow()
        } else {
            PermissionDecision::deny(no_access_message(login))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_merge::policy::PolicyDenial;
    use crate::github::RepoRef;
    use crate::traits::MockMergePolicy;
    use mockall::predicate::*;

    fn pr(base: &str) -> PullRequest {
        PullRequest {
            repo: RepoRef::new("pingcap", "tidb"),
            number: 5,
            title: "t".to_string(),
            base: base.to_string(),
            labels: vec!["LGT2".to_string()],
            merged_at: None,
            author: "alice".to_string(),
        }
    }

    fn evaluator(policy: MockMergePolicy) -> PermissionEvaluator {
        let config = AutoMergeConfig {
            whitelist: vec!["bob".to_string()],
            ..AutoMergeConfig::default()
        };
        PermissionEvaluator::new(&config, Arc::new(policy))
    }

    #[tokio::test]
    async fn test_whitelist_governs_release_branches() {
        let mut policy = MockMergePolicy::new();
        policy.expect_can_merge_to_master().times(0);
        let evaluator = evaluator(policy);

        let allowed = evaluator.can_auto_merge("bob", &pr("release-5.0")).await;
        assert!(allowed.allowed);

        let denied = evaluator.can_auto_merge("eve", &pr("release-5.0")).await;
        assert!(!denied.allowed);
        assert_eq!(denied.reason, no_access_message("eve"));
    }

    #[tokio::test]
    async fn test_master_defers_to_policy_even_for_whitelisted_users() {
        let mut policy = MockMergePolicy::new();
        policy
            .expect_can_merge_to_master()
            .withf(|repo, labels, login| {
                repo.to_string() == "pingcap/tidb" && labels == ["LGT2".to_string()] && login == "bob"
            })
            .times(1)
            .returning(|_, _, _| Err(PolicyDenial::new("Required labels are missing: LGT3.")));

        let decision = evaluator(policy).can_auto_merge("bob", &pr("master")).await;
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason,
            "Sorry @bob, you don't have permission to trigger auto merge event on this branch. \
             Required labels are missing: LGT3."
        );
    }

    #[tokio::test]
    async fn test_master_policy_approval() {
        let mut policy = MockMergePolicy::new();
        policy
            .expect_can_merge_to_master()
            .with(always(), always(), eq("carol"))
            .returning(|_, _, _| Ok(()));

        let decision = evaluator(policy).can_auto_merge("carol", &pr("master")).await;
        assert!(decision.allowed);
        assert!(decision.reason.is_empty());
    }
}
