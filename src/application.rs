//! Pipeline orchestration: scrapers, caching, batching, resumable runs,
//! freshness maintenance, and error reporting.

pub mod batch;
pub mod delivery_model_cache;
pub mod error_report;
pub mod music_post_manager;
pub mod parsing;
pub mod resumable;
pub mod scrapers;

pub use batch::{process_in_parallel, BatchOutcome};
pub use delivery_model_cache::DeliveryModelCache;
pub use error_report::{ErrorKind, ErrorReporter};
pub use music_post_manager::{MaintenanceReport, MusicPostManager, StageStats};
pub use resumable::ResumableProcessor;
pub use scrapers::{DamScraper, JoysoundScraper, SiteScraper};
