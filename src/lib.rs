//! Karaoke catalog ingestion core.
//!
//! Aggregates song records from two external karaoke vendors (JOYSOUND and
//! DAM) that expose only JavaScript-rendered pages, and keeps previously
//! ingested records fresh: priority re-fetch, liveness verification,
//! deadline synchronization and expired-record cleanup.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::entities::KaraokeSource;
pub use domain::error::{IngestError, SessionError, StoreError};
