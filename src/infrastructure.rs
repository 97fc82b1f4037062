//! Infrastructure layer: browser session, HTTP liveness probe, retry
//! executor, configuration and the SQLite-backed catalog store.

pub mod browser_session;
pub mod config;
pub mod logging;
pub mod retry;
pub mod selectors;
pub mod store;
pub mod url_checker;

pub use browser_session::{BrowserSession, BrowserSessionConfig};
pub use retry::with_retry;
pub use store::{CatalogStore, SqliteCatalogStore};
pub use url_checker::{Liveness, LivenessProbe, UrlChecker};
