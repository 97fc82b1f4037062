//! Error taxonomy for the ingestion pipeline.
//!
//! The retry policy only ever retries errors classified as transient here;
//! everything else propagates to the batch layer, which records the item
//! and moves on.

use thiserror::Error;

/// Failures raised by the browser session layer. All of these are treated
/// as transient: the usual recovery is to discard the session and reopen.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation timed out for {url}")]
    Timeout { url: String },

    #[error("pending connections did not settle for {url}")]
    PendingConnections { url: String },

    #[error("required node not found: {selector}")]
    NodeNotFound { selector: String },

    #[error("session already closed")]
    Closed,

    #[error("browser protocol error: {0}")]
    Cdp(String),
}

/// Store-level failures. Unique violations get their own variant so callers
/// can distinguish a concurrent-writer race from a real constraint bug.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return Self::UniqueViolation(db.message().to_string());
            }
        }
        Self::Sqlx(err)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}

/// Classified failure for one scraped item.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Session-layer failure; retried by the retry policy.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The page explicitly no longer exists (404 or an in-page marker).
    /// This is the only classification that may drive deletion.
    #[error("page no longer exists: {url}")]
    ConfirmedAbsent { url: String },

    /// Liveness could not be determined. Callers must never delete on this.
    #[error("liveness unknown for {url}: {reason}")]
    Unknown { url: String, reason: String },

    /// Extracted fields failed required-field checks; the item is skipped.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Anything outside the classes above; the item is abandoned but the
    /// batch continues.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl IngestError {
    /// Whether the retry policy should re-attempt the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Session(_))
    }
}
