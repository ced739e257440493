//! Cherry-pick submission
//!
//! The git work itself belongs to an external program. This module only
//! turns a resolved `(pr, target)` pair into an invocation of that program.

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::cherry_pick::labels::BackportTarget;
use crate::config::CherryPickConfig;
use crate::github::PullRequest;
use crate::traits::CherryPickExecutor;

#[derive(Debug, Error)]
pub enum CherryPickError {
    #[error("cherry-pick program not found: {program}")]
    ProgramNotFound { program: String },
    #[error("cherry-pick to {branch} exited with status {status_code}: {stderr}")]
    Failed {
        branch: String,
        status_code: i32,
        stderr: String,
    },
    #[error("cherry-pick to {branch} rejected: {reason}")]
    Rejected { branch: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the configured cherry-pick program once per submission
#[derive(Debug, Clone)]
pub struct CommandCherryPickExecutor {
    program: String,
    base_args: Vec<String>,
}

impl CommandCherryPickExecutor {
    pub fn new(config: &CherryPickConfig) -> Self {
        Self {
            program: config.executor_program.clone(),
            base_args: config.executor_args.clone(),
        }
    }

    pub fn arguments(&self, pr: &PullRequest, target: &BackportTarget, manual: bool) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend([
            "--repo".to_string(),
            pr.repo.to_string(),
            "--pr".to_string(),
            pr.number.to_string(),
            "--target".to_string(),
            target.branch.clone(),
            "--version".to_string(),
            target.version.clone(),
        ]);
        if manual {
            args.push("--manual".to_string());
        }
        args
    }
}

#[async_trait]
impl CherryPickExecutor for CommandCherryPickExecutor {
    async fn submit(
        &self,
        pr: &PullRequest,
        target: &BackportTarget,
        manual: bool,
    ) -> Result<(), CherryPickError> {
        let args = self.arguments(pr, target, manual);
        debug!(program = %self.program, ?args, "spawning cherry-pick program");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CherryPickError::ProgramNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    CherryPickError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(CherryPickError::Failed {
                branch: target.branch.clone(),
                status_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(pr = %pr, target = %target.branch, manual, "cherry-pick submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::RepoRef;

    fn pr() -> PullRequest {
        PullRequest {
            repo: RepoRef::new("pingcap", "tidb"),
            number: 101,
            title: "ddl: fix race".to_string(),
            base: "master".to_string(),
            labels: vec!["release-5.0".to_string()],
            merged_at: Some(chrono::Utc::now()),
            author: "alice".to_string(),
        }
    }

    fn target() -> BackportTarget {
        BackportTarget {
            branch: "release-5.0".to_string(),
            version: "5.0".to_string(),
        }
    }

    fn executor(program: &str, base_args: &[&str]) -> CommandCherryPickExecutor {
        CommandCherryPickExecutor::new(&CherryPickConfig {
            executor_program: program.to_string(),
            executor_args: base_args.iter().map(|s| s.to_string()).collect(),
            ..CherryPickConfig::default()
        })
    }

    #[test]
    fn test_arguments_carry_request() {
        let args = executor("picker", &["--dry-run"]).arguments(&pr(), &target(), true);
        assert_eq!(
            args,
            vec![
                "--dry-run",
                "--repo",
                "pingcap/tidb",
                "--pr",
                "101",
                "--target",
                "release-5.0",
                "--version",
                "5.0",
                "--manual"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_reported() {
        let result = executor("cherry-bot-definitely-missing-program", &[])
            .submit(&pr(), &target(), false)
            .await;
        assert!(matches!(result, Err(CherryPickError::ProgramNotFound { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_is_checked() {
        assert!(executor("true", &[]).submit(&pr(), &target(), false).await.is_ok());

        let result = executor("false", &[]).submit(&pr(), &target(), false).await;
        assert!(matches!(
            result,
            Err(CherryPickError::Failed { ref branch, .. }) if branch == "release-5.0"
        ));
    }
}
