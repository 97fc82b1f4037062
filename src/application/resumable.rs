//! Resumable sequential runs.
//!
//! A named run keeps a JSON checkpoint of which item ids are done. The
//! checkpoint is written every `checkpoint_every` items and again on
//! interruption or completion, so a killed run loses at most one
//! checkpoint window and re-does those items on resume (at-least-once).

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::entities::{RunItemError, RunStatus};

/// Persisted checkpoint of one named run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    pub run_id: String,
    pub status: RunStatus,
    pub total: usize,
    pub processed_ids: HashSet<String>,
    pub errors: HashMap<String, RunItemError>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunState {
    fn new(run_id: &str, total: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.to_string(),
            status: RunStatus::Pending,
            total,
            processed_ids: HashSet::new(),
            errors: HashMap::new(),
            started_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed_ids.len())
    }

    pub fn resumable(&self) -> bool {
        matches!(self.status, RunStatus::Processing | RunStatus::Interrupted)
    }
}

/// Runs named sequential jobs with checkpointed progress.
pub struct ResumableProcessor {
    state_dir: PathBuf,
    checkpoint_every: usize,
}

impl ResumableProcessor {
    pub fn new(state_dir: &Path, checkpoint_every: usize) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    fn state_path(&self, run_id: &str) -> PathBuf {
        self.state_dir.join(format!("{run_id}.json"))
    }

    /// Load a previous checkpoint, if any.
    pub async fn load(&self, run_id: &str) -> Result<Option<RunState>> {
        let path = self.state_path(run_id);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read run state: {}", path.display()))?;
        let state = serde_json::from_str(&raw)
            .with_context(|| format!("corrupt run state: {}", path.display()))?;
        Ok(Some(state))
    }

    /// `(done, total)` of a known run, if a checkpoint exists.
    pub async fn progress(&self, run_id: &str) -> Result<Option<(usize, usize)>> {
        Ok(self
            .load(run_id)
            .await?
            .map(|s| (s.processed_ids.len(), s.total)))
    }

    /// Discard a run's checkpoint; the next `process` starts from scratch.
    pub async fn reset(&self, run_id: &str) -> Result<()> {
        let path = self.state_path(run_id);
        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn save(&self, state: &mut RunState) -> Result<()> {
        state.updated_at = Utc::now();
        fs::create_dir_all(&self.state_dir).await?;
        let path = self.state_path(&state.run_id);
        fs::write(&path, serde_json::to_string_pretty(state)?)
            .await
            .with_context(|| format!("failed to write run state: {}", path.display()))?;
        Ok(())
    }

    /// Process `items` in order, skipping ids a previous run already
    /// finished. The cancellation token is checked between items; a
    /// cancelled run checkpoints as `Interrupted` and can be resumed by
    /// calling `process` again with the same `run_id`.
    pub async fn process<T, I, F, Fut>(
        &self,
        run_id: &str,
        items: Vec<T>,
        id_of: I,
        cancel: &CancellationToken,
        mut handler: F,
    ) -> Result<RunState>
    where
        I: Fn(&T) -> String,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), crate::domain::error::IngestError>>,
    {
        let mut state = match self.load(run_id).await? {
            Some(prev) if prev.resumable() => {
                info!(
                    "resuming run '{run_id}': {} of {} already done",
                    prev.processed_ids.len(),
                    prev.total
                );
                prev
            }
            _ => RunState::new(run_id, items.len()),
        };
        state.status = RunStatus::Processing;
        state.total = items.len();
        self.save(&mut state).await?;

        let mut since_checkpoint = 0usize;
        for item in items {
            if cancel.is_cancelled() {
                state.status = RunStatus::Interrupted;
                self.save(&mut state).await?;
                info!(
                    "run '{run_id}' interrupted: {} of {} done",
                    state.processed_ids.len(),
                    state.total
                );
                return Ok(state);
            }

            let id = id_of(&item);
            if state.processed_ids.contains(&id) {
                continue;
            }

            if let Err(e) = handler(item).await {
                warn!("run '{run_id}' item '{id}' failed: {e}");
                state.errors.insert(
                    id.clone(),
                    RunItemError {
                        message: e.to_string(),
                        timestamp: Utc::now(),
                    },
                );
            }
            state.processed_ids.insert(id);

            since_checkpoint += 1;
            if since_checkpoint >= self.checkpoint_every {
                self.save(&mut state).await?;
                since_checkpoint = 0;
            }
        }

        state.status = RunStatus::Completed;
        state.completed_at = Some(Utc::now());
        self.save(&mut state).await?;
        info!(
            "run '{run_id}' completed: {} items, {} errors",
            state.processed_ids.len(),
            state.errors.len()
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::IngestError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn interrupted_run_resumes_without_reprocessing() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ResumableProcessor::new(dir.path(), 10);
        let items: Vec<String> = (0..100).map(|i| format!("item-{i}")).collect();

        let cancel = CancellationToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let (c, token) = (calls.clone(), cancel.clone());
        let state = processor
            .process("refresh", items.clone(), |i| i.clone(), &cancel, move |_item| {
                let (c, token) = (c.clone(), token.clone());
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) + 1 == 40 {
                        token.cancel();
                    }
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(state.status, RunStatus::Interrupted);
        assert_eq!(state.processed_ids.len(), 40);
        assert!(state.resumable());

        let cancel = CancellationToken::new();
        let resumed_calls = Arc::new(AtomicUsize::new(0));
        let c = resumed_calls.clone();
        let state = processor
            .process("refresh", items, |i| i.clone(), &cancel, move |_item| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(state.processed_ids.len(), 100);
        assert_eq!(resumed_calls.load(Ordering::SeqCst), 60);
    }

    #[tokio::test]
    async fn item_failures_are_recorded_and_not_retried_within_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ResumableProcessor::new(dir.path(), 5);
        let items: Vec<String> = (0..10).map(|i| format!("song-{i}")).collect();

        let cancel = CancellationToken::new();
        let state = processor
            .process("fetch", items, |i| i.clone(), &cancel, |item| async move {
                if item == "song-3" {
                    Err(IngestError::Validation("title missing".into()))
                } else {
                    Ok(())
                }
            })
            .await
            .unwrap();

        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(state.processed_ids.len(), 10);
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors.contains_key("song-3"));
        assert!(!state.resumable());
    }

    #[tokio::test]
    async fn completed_run_starts_fresh_next_time() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ResumableProcessor::new(dir.path(), 10);
        let cancel = CancellationToken::new();

        let items = vec!["a".to_string(), "b".to_string()];
        processor
            .process("once", items.clone(), |i| i.clone(), &cancel, |_| async { Ok(()) })
            .await
            .unwrap();

        // A finished checkpoint does not suppress a new run over the same ids.
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let state = processor
            .process("once", items, |i| i.clone(), &cancel, move |_| {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn reset_discards_the_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let processor = ResumableProcessor::new(dir.path(), 10);
        let cancel = CancellationToken::new();
        processor
            .process("gone", vec!["x".to_string()], |i| i.clone(), &cancel, |_| async {
                Ok(())
            })
            .await
            .unwrap();
        assert!(processor.load("gone").await.unwrap().is_some());
        processor.reset("gone").await.unwrap();
        assert!(processor.load("gone").await.unwrap().is_none());
    }
}
