//! Lightweight URL existence probes.
//!
//! A HEAD request with its own timeout and retry budget, independent of the
//! browser session. The result is deliberately three-way: a clean response
//! below 400 confirms existence, a clean 4xx/5xx confirms absence, and an
//! exhausted network-error budget yields `Unknown`. Callers must never
//! delete a catalog entry on `Unknown` — only a confirmed `Missing`
//! justifies deletion.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::infrastructure::config::LivenessConfig;

/// Three-way liveness verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Exists { status: u16 },
    Missing { status: u16 },
    Unknown { reason: String },
}

impl Liveness {
    /// Only a confirmed `Missing` may drive deletion.
    pub fn confirmed_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Seam for the freshness stages; tests substitute stub probes.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self, url: &str) -> Liveness;
}

/// HEAD-request liveness checker.
pub struct UrlChecker {
    client: reqwest::Client,
    max_attempts: u32,
}

impl UrlChecker {
    pub fn new(config: &LivenessConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_default();
        Self {
            client,
            max_attempts: config.max_attempts.max(1),
        }
    }
}

#[async_trait]
impl LivenessProbe for UrlChecker {
    async fn check(&self, url: &str) -> Liveness {
        if url.trim().is_empty() {
            return Liveness::Unknown {
                reason: "empty url".into(),
            };
        }

        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            match self.client.head(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    return if status < 400 {
                        Liveness::Exists { status }
                    } else {
                        debug!("liveness check: {url} returned {status}");
                        Liveness::Missing { status }
                    };
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < self.max_attempts {
                        warn!("liveness check retry {attempt}/{} for {url}: {e}", self.max_attempts);
                        tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    }
                }
            }
        }

        warn!("liveness unknown for {url}: {last_error}");
        Liveness::Unknown { reason: last_error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_confirms_deletion() {
        assert!(!Liveness::Exists { status: 200 }.confirmed_missing());
        assert!(Liveness::Missing { status: 404 }.confirmed_missing());
        assert!(!Liveness::Unknown {
            reason: "timeout".into()
        }
        .confirmed_missing());
    }

    #[tokio::test]
    async fn empty_url_is_unknown_not_missing() {
        let checker = UrlChecker::new(&LivenessConfig::default());
        let verdict = checker.check("  ").await;
        assert!(matches!(verdict, Liveness::Unknown { .. }));
    }
}
