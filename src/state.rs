use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::auto_merge::intent::{AutoMergeIntent, IntentStatus, SaveOutcome};
use crate::github::{PullRequest, RepoRef};
use crate::traits::{Bookkeeping, IntentStore};

/// Errors that can occur during state persistence operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("State corruption detected: {reason}")]
    StateCorruption { reason: String },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

/// A PR whose title marks it as a backport commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CherryPickRecord {
    pub title: String,
    pub base: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    labels: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    merges: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    cherry_picks: BTreeMap<String, CherryPickRecord>,
    #[serde(default)]
    intents: BTreeMap<String, AutoMergeIntent>,
}

fn pr_key(repo: &RepoRef, number: u64) -> String {
    format!("{}/{}#{}", repo.owner, repo.name, number)
}

/// Bookkeeping and auto-merge intents behind one async lock.
///
/// Every mutation is a keyed upsert, so replays and duplicate deliveries
/// converge on the same state. With a path, the whole state is rewritten to
/// a JSON file after each mutation (write to a temp file, then rename). A
/// mutation is applied to a copy first and only becomes visible once that
/// copy is on disk, so a failed write leaves nothing behind for a retry to
/// trip over.
///
/// Retention: each PR key holds at most one record per map, so a new
/// pending intent replaces a finished one. Older records are dropped by
/// [`StateStore::prune`]: finished intents, merges (with their labels) and
/// cherry-pick records older than the cutoff. Pending intents and labels of
/// unmerged PRs are kept.
#[derive(Debug)]
pub struct StateStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl StateStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Open a file-backed store, starting empty if the file does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => StoreState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PersistenceError::StateCorruption {
                    reason: format!("{}: {e}", path.display()),
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "starting with empty state store");
                StoreState::default()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(state)?).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Run `change` against a copy of the state. The copy replaces the live
    /// state only when `change` reports a modification and it was persisted.
    async fn update<T>(
        &self,
        change: impl FnOnce(&mut StoreState) -> (T, bool) + Send,
    ) -> Result<T, PersistenceError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let (value, changed) = change(&mut next);
        if changed {
            self.persist(&next).await?;
            *state = next;
        }
        Ok(value)
    }

    pub async fn labels_for(&self, repo: &RepoRef, number: u64) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .labels
            .get(&pr_key(repo, number))
            .map(|labels| labels.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn merged_at(&self, repo: &RepoRef, number: u64) -> Option<DateTime<Utc>> {
        self.state.lock().await.merges.get(&pr_key(repo, number)).copied()
    }

    pub async fn cherry_pick(&self, repo: &RepoRef, number: u64) -> Option<CherryPickRecord> {
        self.state
            .lock()
            .await
            .cherry_picks
            .get(&pr_key(repo, number))
            .cloned()
    }

    pub async fn intent(&self, repo: &RepoRef, number: u64) -> Option<AutoMergeIntent> {
        self.state.lock().await.intents.get(&pr_key(repo, number)).cloned()
    }

    pub async fn pending_intents(&self) -> Vec<AutoMergeIntent> {
        self.state
            .lock()
            .await
            .intents
            .values()
            .filter(|intent| intent.is_pending())
            .cloned()
            .collect()
    }

    /// Flip an intent to `Done`; returns false when there was nothing pending
    pub async fn mark_done(&self, repo: &RepoRef, number: u64) -> Result<bool, PersistenceError> {
        let key = pr_key(repo, number);
        self.update(|state| match state.intents.get_mut(&key) {
            Some(intent) if intent.is_pending() => {
                intent.status = IntentStatus::Done;
                (true, true)
            }
            _ => (false, false),
        })
        .await
    }

    /// Drop records that finished before `cutoff`; returns how many went
    pub async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, PersistenceError> {
        let pruned = self
            .update(|state| {
                let before = state.len();

                state
                    .intents
                    .retain(|_, intent| intent.is_pending() || intent.created_at >= cutoff);
                state
                    .cherry_picks
                    .retain(|_, record| record.recorded_at >= cutoff);

                let expired: Vec<String> = state
                    .merges
                    .iter()
                    .filter(|(_, merged_at)| **merged_at < cutoff)
                    .map(|(key, _)| key.clone())
                    .collect();
                for key in &expired {
                    state.merges.remove(key);
                    state.labels.remove(key);
                }

                let pruned = before - state.len();
                (pruned, pruned > 0)
            })
            .await?;

        if pruned > 0 {
            info!(pruned, cutoff = %cutoff, "pruned finished state records");
        }
        Ok(pruned)
    }
}

impl StoreState {
    fn len(&self) -> usize {
        self.labels.len() + self.merges.len() + self.cherry_picks.len() + self.intents.len()
    }
}

#[async_trait]
impl Bookkeeping for StateStore {
    async fn commit_label(&self, pr: &PullRequest, label: &str) -> Result<(), PersistenceError> {
        let key = pr_key(&pr.repo, pr.number);
        let inserted = self
            .update(|state| {
                let inserted = state.labels.entry(key).or_default().insert(label.to_string());
                (inserted, inserted)
            })
            .await?;
        if inserted {
            debug!(pr = %pr, label, "label committed");
        }
        Ok(())
    }

    async fn remove_label(&self, pr: &PullRequest, label: &str) -> Result<(), PersistenceError> {
        let key = pr_key(&pr.repo, pr.number);
        let removed = self
            .update(|state| {
                let removed = state
                    .labels
                    .get_mut(&key)
                    .is_some_and(|labels| labels.remove(label));
                if state.labels.get(&key).is_some_and(BTreeSet::is_empty) {
                    state.labels.remove(&key);
                }
                (removed, removed)
            })
            .await?;
        if removed {
            debug!(pr = %pr, label, "label removed");
        }
        Ok(())
    }

    async fn commit_merge(&self, pr: &PullRequest) -> Result<(), PersistenceError> {
        let Some(merged_at) = pr.merged_at else {
            debug!(pr = %pr, "not merged, nothing to record");
            return Ok(());
        };

        let key = pr_key(&pr.repo, pr.number);
        self.update(|state| {
            let previous = state.merges.insert(key, merged_at);
            ((), previous != Some(merged_at))
        })
        .await
    }

    async fn create_cherry_pick(&self, pr: &PullRequest) -> Result<(), PersistenceError> {
        let key = pr_key(&pr.repo, pr.number);
        self.update(|state| {
            let unchanged = state
                .cherry_picks
                .get(&key)
                .is_some_and(|record| record.title == pr.title && record.base == pr.base);
            if !unchanged {
                state.cherry_picks.insert(
                    key,
                    CherryPickRecord {
                        title: pr.title.clone(),
                        base: pr.base.clone(),
                        recorded_at: Utc::now(),
                    },
                );
            }
            ((), !unchanged)
        })
        .await
    }
}

#[async_trait]
impl IntentStore for StateStore {
    /// A finished intent for the same PR is replaced, not kept alongside
    async fn save(&self, intent: &AutoMergeIntent) -> Result<SaveOutcome, PersistenceError> {
        let key = pr_key(&intent.repo_ref(), intent.pr_number);
        self.update(|state| {
            if state.intents.get(&key).is_some_and(AutoMergeIntent::is_pending) {
                return (SaveOutcome::AlreadyPending, false);
            }
            state.intents.insert(key, intent.clone());
            (SaveOutcome::Created, true)
        })
        .await
    }
}
