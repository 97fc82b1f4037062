//! Bounded retry executor for transient scraping failures.
//!
//! A single higher-order function composed explicitly by each scraper; the
//! recovery callback typically discards the browser session so the next
//! attempt relaunches it.

use std::future::Future;

use tracing::{error, warn};

use crate::domain::error::IngestError;

/// Run `op` up to `max_attempts` times, retrying only failures classified
/// as transient ([`IngestError::is_transient`]). `on_retry` runs between
/// attempts with the error and the attempt number that failed. The last
/// error is re-raised once attempts are exhausted; non-transient failures
/// propagate immediately.
pub async fn with_retry<T, F, Fut, R, RFut>(
    max_attempts: u32,
    mut op: F,
    mut on_retry: R,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
    R: FnMut(&IngestError, u32) -> RFut,
    RFut: Future<Output = ()>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!("retry {attempt}/{max_attempts} due to {err}");
                on_retry(&err, attempt).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_transient() {
                    error!("max retries ({max_attempts}) exceeded: {err}");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SessionError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn timeout_err() -> IngestError {
        IngestError::Session(SessionError::Timeout {
            url: "https://example.com".into(),
        })
    }

    #[tokio::test]
    async fn retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let recoveries = AtomicU32::new(0);

        let result = with_retry(
            3,
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(timeout_err())
                } else {
                    Ok(42)
                }
            },
            |_err, _attempt| async {
                recoveries.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(recoveries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            3,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(timeout_err())
            },
            |_e, _n| async {},
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_propagates_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(
            3,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(IngestError::Validation("title missing".into()))
            },
            |_e, _n| async {},
        )
        .await;

        assert!(matches!(result, Err(IngestError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
