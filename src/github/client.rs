use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use octocrab::Octocrab;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::errors::GitHubError;
use super::types::{PullRequest, RepoRef};
use crate::config::GitHubConfig;
use crate::traits::{CommentStore, Membership, PullRequestStore};

/// Rate-limited GitHub REST client backing the pull request, comment and
/// membership collaborators.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    org: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    membership_cache: Cache<String, bool>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = config
            .token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                GitHubError::TokenNotFound("no GitHub token configured".to_string())
            })?;

        let octocrab = Octocrab::builder()
            .personal_token(token.to_string())
            .build()?;

        Ok(Self::with_octocrab(octocrab, config))
    }

    pub fn with_octocrab(octocrab: Octocrab, config: &GitHubConfig) -> Self {
        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);

        let membership_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(config.membership_cache_ttl_seconds))
            .build();

        Self {
            octocrab,
            org: config.org().to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            membership_cache,
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;
    }

    async fn is_collaborator(&self, repo: &RepoRef, login: &str) -> Result<bool, GitHubError> {
        self.throttle().await;
        Ok(self
            .octocrab
            .repos(&repo.owner, &repo.name)
            .is_collaborator(login)
            .await?)
    }
}

#[async_trait]
impl PullRequestStore for GitHubClient {
    async fn get(&self, repo: &RepoRef, number: u64) -> Result<PullRequest, GitHubError> {
        self.throttle().await;
        let pr = self.octocrab.pulls(&repo.owner, &repo.name).get(number).await?;
        Ok(PullRequest::from_octocrab(repo.clone(), pr))
    }

    async fn apply_label(&self, repo: &RepoRef, number: u64, label: &str) -> Result<(), GitHubError> {
        self.throttle().await;
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .add_labels(number, &[label.to_string()])
            .await?;
        debug!(repository = %repo, number, label, "label applied");
        Ok(())
    }

    async fn remove_label(&self, repo: &RepoRef, number: u64, label: &str) -> Result<(), GitHubError> {
        self.throttle().await;
        match self
            .octocrab
            .issues(&repo.owner, &repo.name)
            .remove_label(number, label)
            .await
            .map_err(GitHubError::from)
        {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => {
                debug!(repository = %repo, number, label, "label was not present");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl CommentStore for GitHubClient {
    async fn create(&self, repo: &RepoRef, number: u64, body: &str) -> Result<(), GitHubError> {
        self.throttle().await;
        self.octocrab
            .issues(&repo.owner, &repo.name)
            .create_comment(number, body)
            .await?;
        debug!(repository = %repo, number, "comment posted");
        Ok(())
    }
}

#[async_trait]
impl Membership for GitHubClient {
    async fn is_member(&self, login: &str) -> bool {
        if let Some(member) = self.membership_cache.get(login).await {
            return member;
        }

        self.throttle().await;
        match self.octocrab.orgs(&self.org).check_membership(login).await {
            Ok(member) => {
                self.membership_cache.insert(login.to_string(), member).await;
                member
            }
            Err(err) => {
                warn!(org = %self.org, login, error = %GitHubError::from(err), "membership lookup failed");
                false
            }
        }
    }

    async fn invite_if_not_collaborator(&self, login: &str, pr: &PullRequest) -> Result<(), GitHubError> {
        if self.is_collaborator(&pr.repo, login).await? {
            debug!(repository = %pr.repo, login, "already a collaborator");
            return Ok(());
        }

        self.throttle().await;
        let route = format!("/repos/{}/{}/collaborators/{}", pr.repo.owner, pr.repo.name, login);
        let response = self.octocrab._put(route, None::<&()>).await?;
        octocrab::map_github_error(response).await?;
        info!(repository = %pr.repo, login, "collaborator invitation created");
        Ok(())
    }
}
