use anyhow::Context;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use super::labels::{BackportTarget, LabelParser};
use crate::executor::CherryPickError;
use crate::github::PullRequest;
use crate::traits::{Bookkeeping, CherryPickExecutor};

/// Squash-merged backports end in `(#<original PR>)`
static BACKPORT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#[0-9]+\)$").expect("backport title pattern is valid"));

pub fn is_backport_commit(title: &str) -> bool {
    BACKPORT_TITLE.is_match(title)
}

/// A single submission that failed; siblings were still attempted
#[derive(Debug)]
pub struct DispatchFailure {
    pub label: String,
    pub target: BackportTarget,
    pub error: CherryPickError,
}

impl DispatchFailure {
    pub fn into_error(self, pr: &PullRequest) -> anyhow::Error {
        anyhow::Error::new(self.error).context(format!(
            "submit cherry-pick of {pr} to {} (label {})",
            self.target.branch, self.label
        ))
    }
}

#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Targets handed to the executor, in label order
    pub submitted: Vec<BackportTarget>,
    /// Labels that are not backport labels, or repeat an earlier target
    pub skipped: Vec<String>,
    pub failures: Vec<DispatchFailure>,
}

#[derive(Debug, Default)]
pub struct LifecycleReport {
    /// The PR is itself a backport and was recorded as such
    pub backport_commit: bool,
    pub committed_labels: Vec<String>,
    pub merge_recorded: bool,
    pub failures: Vec<anyhow::Error>,
}

/// Decides which cherry-picks and which bookkeeping a PR gets
pub struct CherryPickDispatcher {
    parser: LabelParser,
    executor: Arc<dyn CherryPickExecutor>,
    bookkeeping: Arc<dyn Bookkeeping>,
}

impl CherryPickDispatcher {
    pub fn new(
        parser: LabelParser,
        executor: Arc<dyn CherryPickExecutor>,
        bookkeeping: Arc<dyn Bookkeeping>,
    ) -> Self {
        Self {
            parser,
            executor,
            bookkeeping,
        }
    }

    pub fn parser(&self) -> &LabelParser {
        &self.parser
    }

    /// Record one label against the PR. Status labels are not recorded and
    /// yield `Ok(false)`.
    pub async fn commit_label(&self, pr: &PullRequest, label: &str) -> anyhow::Result<bool> {
        if self.parser.is_status_label(label) {
            debug!(pr = %pr, label, "status label not recorded");
            return Ok(false);
        }
        self.bookkeeping
            .commit_label(pr, label)
            .await
            .with_context(|| format!("commit label {label:?} on {pr}"))?;
        Ok(true)
    }

    /// Lifecycle pass over a PR.
    ///
    /// A PR that is itself a backport commit is recorded as a cherry-pick and
    /// gets no label or merge bookkeeping. Any other PR has each non-status
    /// label recorded, plus its merge when it is merged. A failing label does
    /// not stop the others.
    pub async fn process_pull_request(&self, pr: &PullRequest) -> LifecycleReport {
        let mut report = LifecycleReport::default();

        if is_backport_commit(&pr.title) {
            match self
                .bookkeeping
                .create_cherry_pick(pr)
                .await
                .with_context(|| format!("record backport commit {pr}"))
            {
                Ok(()) => report.backport_commit = true,
                Err(err) => report.failures.push(err),
            }
            return report;
        }

        for label in &pr.labels {
            match self.commit_label(pr, label).await {
                Ok(true) => report.committed_labels.push(label.clone()),
                Ok(false) => {}
                Err(err) => report.failures.push(err),
            }
        }

        if pr.is_merged() {
            match self
                .bookkeeping
                .commit_merge(pr)
                .await
                .with_context(|| format!("commit merge of {pr}"))
            {
                Ok(()) => report.merge_recorded = true,
                Err(err) => report.failures.push(err),
            }
        }

        report
    }

    /// Submit one cherry-pick per distinct backport target on the PR.
    ///
    /// Labels are visited in platform order. Unparseable labels are skipped,
    /// a target already submitted in this call is not submitted again, and a
    /// failed submission is captured without aborting the loop.
    pub async fn dispatch(&self, pr: &PullRequest, manual: bool) -> DispatchReport {
        let mut report = DispatchReport::default();
        let mut seen = HashSet::new();

        for label in &pr.labels {
            let Some(target) = self.parser.parse(label) else {
                debug!(pr = %pr, label, "not a backport label");
                report.skipped.push(label.clone());
                continue;
            };

            if !seen.insert(target.clone()) {
                debug!(pr = %pr, label, target = %target.branch, "target already submitted");
                report.skipped.push(label.clone());
                continue;
            }

            info!(pr = %pr, label, target = %target.branch, version = %target.version, "submitting cherry-pick");
            match self.executor.submit(pr, &target, manual).await {
                Ok(()) => report.submitted.push(target),
                Err(error) => {
                    warn!(pr = %pr, target = %target.branch, %error, "cherry-pick submission failed");
                    report.failures.push(DispatchFailure {
                        label: label.clone(),
                        target,
                        error,
                    });
                }
            }
        }

        report
    }
}
