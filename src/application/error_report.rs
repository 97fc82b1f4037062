//! Error aggregation and reporting for scraping runs.
//!
//! Failures are classified, counted, and summarized at the end of a run;
//! when the count crosses the configured threshold the reporter also
//! writes a CSV export for offline triage.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::error::{IngestError, SessionError};

/// Coarse failure classes used for counting and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Timeout,
    PendingConnections,
    NodeNotFound,
    SessionOther,
    PageMissing,
    LivenessUnknown,
    Validation,
    Store,
    Other,
}

impl ErrorKind {
    pub fn classify(err: &IngestError) -> Self {
        match err {
            IngestError::Session(SessionError::Timeout { .. }) => Self::Timeout,
            IngestError::Session(SessionError::PendingConnections { .. }) => {
                Self::PendingConnections
            }
            IngestError::Session(SessionError::NodeNotFound { .. }) => Self::NodeNotFound,
            IngestError::Session(_) => Self::SessionOther,
            IngestError::ConfirmedAbsent { .. } => Self::PageMissing,
            IngestError::Unknown { .. } => Self::LivenessUnknown,
            IngestError::Validation(_) => Self::Validation,
            IngestError::Store(_) => Self::Store,
            IngestError::Fatal(_) => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::PendingConnections => "pending_connections",
            Self::NodeNotFound => "node_not_found",
            Self::SessionOther => "session",
            Self::PageMissing => "page_missing",
            Self::LivenessUnknown => "liveness_unknown",
            Self::Validation => "validation",
            Self::Store => "store",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone)]
struct ErrorEntry {
    kind: ErrorKind,
    url: String,
    message: String,
    at: DateTime<Utc>,
}

/// Run summary derived from the recorded entries.
#[derive(Debug, Clone)]
pub struct ErrorSummary {
    pub total: usize,
    pub by_kind: Vec<(ErrorKind, usize)>,
    pub duration_minutes: f64,
    pub errors_per_minute: f64,
}

/// Thread-safe error collector for one run.
pub struct ErrorReporter {
    entries: Mutex<Vec<ErrorEntry>>,
    started_at: DateTime<Utc>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            started_at: Utc::now(),
        }
    }

    pub fn record(&self, url: &str, err: &IngestError) {
        let entry = ErrorEntry {
            kind: ErrorKind::classify(err),
            url: url.to_string(),
            message: err.to_string(),
            at: Utc::now(),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    pub fn count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn summary(&self) -> ErrorSummary {
        let entries = self.entries.lock().map(|e| e.clone()).unwrap_or_default();
        let mut counts: Vec<(ErrorKind, usize)> = Vec::new();
        for entry in &entries {
            match counts.iter_mut().find(|(kind, _)| *kind == entry.kind) {
                Some((_, n)) => *n += 1,
                None => counts.push((entry.kind, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let duration_minutes =
            (Utc::now() - self.started_at).num_milliseconds() as f64 / 60_000.0;
        let errors_per_minute = if duration_minutes > 0.0 {
            entries.len() as f64 / duration_minutes
        } else {
            0.0
        };
        ErrorSummary {
            total: entries.len(),
            by_kind: counts,
            duration_minutes,
            errors_per_minute,
        }
    }

    /// Operator hints keyed off the dominant failure classes.
    pub fn recommendations(&self) -> Vec<String> {
        let summary = self.summary();
        let mut out = Vec::new();
        for (kind, count) in &summary.by_kind {
            match kind {
                ErrorKind::Timeout | ErrorKind::PendingConnections if *count >= 5 => {
                    out.push(format!(
                        "{count} timeout-class errors: raise the navigation timeout or lower worker_count"
                    ));
                }
                ErrorKind::NodeNotFound if *count >= 3 => {
                    out.push(format!(
                        "{count} missing-node errors: the site markup may have changed, review the selector file"
                    ));
                }
                ErrorKind::Store if *count >= 1 => {
                    out.push(format!("{count} store errors: check the database file and disk"));
                }
                _ => {}
            }
        }
        out
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        if summary.total == 0 {
            info!("run finished with no errors");
            return;
        }
        warn!(
            "run finished with {} errors over {:.1} min ({:.2}/min)",
            summary.total, summary.duration_minutes, summary.errors_per_minute
        );
        for (kind, count) in &summary.by_kind {
            warn!("  {}: {count}", kind.as_str());
        }
        for hint in self.recommendations() {
            warn!("  hint: {hint}");
        }
    }

    /// Write all entries to a timestamped CSV under `dir`.
    pub fn export_csv(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "scrape-errors-{}.csv",
            Utc::now().format("%Y%m%d-%H%M%S")
        ));
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create report: {}", path.display()))?;
        writer.write_record(["timestamp", "kind", "url", "message"])?;

        let entries = self.entries.lock().map(|e| e.clone()).unwrap_or_default();
        for entry in &entries {
            writer.write_record([
                entry.at.to_rfc3339().as_str(),
                entry.kind.as_str(),
                entry.url.as_str(),
                entry.message.as_str(),
            ])?;
        }
        writer.flush()?;
        info!("error report written to {}", path.display());
        Ok(path)
    }

    /// Export only when the error count crosses the threshold.
    pub fn maybe_export(&self, dir: &Path, threshold: usize) -> Result<Option<PathBuf>> {
        if self.count() >= threshold.max(1) {
            Ok(Some(self.export_csv(dir)?))
        } else {
            Ok(None)
        }
    }
}
