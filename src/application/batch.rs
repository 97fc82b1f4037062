//! Batch/parallel orchestration.
//!
//! Items are split into fixed-size batches processed strictly in order;
//! inside a batch a semaphore caps concurrent workers. Per-item failures
//! are collected, never propagated, so one bad page cannot sink a run.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::domain::error::IngestError;
use crate::infrastructure::config::BatchConfig;

/// Aggregate result of a parallel run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub processed: usize,
    /// `(item index, error message)` for every failed item.
    pub errors: Vec<(usize, String)>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.processed - self.errors.len()
    }
}

/// Run `handler` over every item, `worker_count` at a time within each
/// batch of `batch_size`. Batches run one after another so progress and
/// memory stay bounded on long listings.
pub async fn process_in_parallel<T, F, Fut>(
    items: Vec<T>,
    config: &BatchConfig,
    handler: F,
) -> BatchOutcome
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), IngestError>> + Send + 'static,
{
    let total = items.len();
    let batch_size = config.batch_size.max(1);
    let worker_count = config.worker_count.max(1);

    let handler = Arc::new(handler);
    let semaphore = Arc::new(Semaphore::new(worker_count));
    let mut outcome = BatchOutcome::default();

    let mut items = items.into_iter().enumerate();
    let mut batch_no = 0usize;
    loop {
        let batch: Vec<(usize, T)> = items.by_ref().take(batch_size).collect();
        if batch.is_empty() {
            break;
        }
        batch_no += 1;
        info!(
            "batch {batch_no}: {} items ({} of {total} done)",
            batch.len(),
            outcome.processed
        );

        let mut set = JoinSet::new();
        for (index, item) in batch {
            let handler = handler.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                // Closing the semaphore is not part of this design; acquire
                // can only fail then, so treat it as a fatal item error.
                let result = match semaphore.acquire().await {
                    Ok(_permit) => handler(item).await,
                    Err(e) => Err(IngestError::Fatal(e.to_string())),
                };
                (index, result)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, Ok(()))) => {
                    outcome.processed += 1;
                    info!("item {}/{total} done", index + 1);
                }
                Ok((index, Err(e))) => {
                    outcome.processed += 1;
                    warn!("item {}/{total} failed: {e}", index + 1);
                    outcome.errors.push((index, e.to_string()));
                }
                Err(join_err) => {
                    warn!("worker task failed: {join_err}");
                    outcome.errors.push((usize::MAX, join_err.to_string()));
                }
            }
        }
    }

    info!(
        "parallel run complete: {}/{total} ok, {} errors",
        outcome.succeeded(),
        outcome.errors.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(batch_size: usize, worker_count: usize) -> BatchConfig {
        BatchConfig {
            batch_size,
            worker_count,
        }
    }

    #[tokio::test]
    async fn processes_every_item() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let outcome = process_in_parallel((0..25).collect(), &config(10, 4), move |_item: i32| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;
        assert_eq!(outcome.processed, 25);
        assert_eq!(counter.load(Ordering::SeqCst), 25);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn failures_are_collected_not_propagated() {
        let outcome = process_in_parallel((0..10).collect(), &config(100, 3), |item: i32| async move {
            if item % 3 == 0 {
                Err(IngestError::Fatal(format!("boom {item}")))
            } else {
                Ok(())
            }
        })
        .await;
        assert_eq!(outcome.processed, 10);
        assert_eq!(outcome.errors.len(), 4);
        assert_eq!(outcome.succeeded(), 6);
    }

    #[tokio::test]
    async fn concurrency_stays_within_worker_count() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (active.clone(), peak.clone());

        process_in_parallel((0..30).collect(), &config(30, 5), move |_item: i32| {
            let (a, p) = (a.clone(), p.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 5);
    }
}
