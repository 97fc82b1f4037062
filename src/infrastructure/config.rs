//! Application configuration.
//!
//! Plain serde structs with defaults, loadable from a JSON file. The policy
//! constants here (retry bound, cache TTL, upcoming-deadline window) are
//! defaults, not invariants; operators tune them without code changes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::infrastructure::selectors::SelectorConfig;

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file for the catalog store.
    pub database_path: PathBuf,

    /// Directory for resumable-run checkpoint files.
    pub state_dir: PathBuf,

    /// Directory for error-report CSV exports.
    pub report_dir: PathBuf,

    pub browser: BrowserConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub batch: BatchConfig,
    pub liveness: LivenessConfig,
    pub maintenance: MaintenanceConfig,
    pub filters: VendorFilters,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/karaoke.db"),
            state_dir: PathBuf::from("./data/processing_states"),
            report_dir: PathBuf::from("./data/reports"),
            browser: BrowserConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            batch: BatchConfig::default(),
            liveness: LivenessConfig::default(),
            maintenance: MaintenanceConfig::default(),
            filters: VendorFilters::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, creating it with defaults when
    /// missing so operators always have a file to edit.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            let raw = fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&raw)
                .with_context(|| format!("invalid config file: {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path).await?;
            info!("created default config at {}", path.display());
            Ok(config)
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw)
            .await
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Load the per-vendor selector tables, falling back to the built-in
    /// defaults when no selector file is configured.
    pub async fn load_selectors(&self, path: Option<&Path>) -> Result<SelectorConfig> {
        match path {
            Some(p) => SelectorConfig::load(p).await,
            None => Ok(SelectorConfig::default()),
        }
    }
}

/// Browser session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Navigation timeout in seconds.
    pub timeout_seconds: u64,

    /// Extra wait after navigation for asynchronous hydration, in ms.
    pub idle_wait_ms: u64,

    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            idle_wait_ms: 1000,
            window_width: 1440,
            window_height: 900,
        }
    }
}

/// Retry policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts for a transient failure (first try included).
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Entity resolution cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_minutes: 60 }
    }
}

/// Batch/parallel orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub worker_count: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            worker_count: 7,
        }
    }
}

/// Liveness checker settings, independent of the browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub timeout_seconds: u64,
    /// Attempts on network/timeout errors before reporting unknown.
    pub max_attempts: u32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            max_attempts: 3,
        }
    }
}

/// Freshness maintenance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Music posts whose deadline falls within this many days are
    /// re-fetched ahead of the rest.
    pub upcoming_window_days: i64,

    /// Error count above which the reporter writes a CSV export.
    pub error_export_threshold: usize,

    /// Checkpoint interval for resumable runs, in items.
    pub checkpoint_every: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            upcoming_window_days: 30,
            error_export_threshold: 10,
            checkpoint_every: 10,
        }
    }
}

/// Vendor keep-predicates. The catalog intentionally admits only a themed
/// subset of each vendor's songs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorFilters {
    pub joysound: JoysoundFilter,
    pub dam: DamFilter,
}

/// JOYSOUND admits a page when its composer is permitted, or when the page
/// URL is explicitly allow-listed (covers arrangement credits).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoysoundFilter {
    pub permitted_composers: Vec<String>,
    pub url_allowlist: Vec<String>,
}

impl Default for JoysoundFilter {
    fn default() -> Self {
        Self {
            permitted_composers: vec![
                "ZUN".into(),
                "ZUN(上海アリス幻樂団)".into(),
                "ZUN[上海アリス幻樂団]".into(),
                "ZUN，あきやまうに".into(),
                "あきやまうに".into(),
                "U2".into(),
            ],
            url_allowlist: vec![
                "https://www.joysound.com/web/search/song/115474".into(),
                "https://www.joysound.com/web/search/song/225460".into(),
                "https://www.joysound.com/web/search/song/225456".into(),
                "https://www.joysound.com/web/search/song/225449".into(),
            ],
        }
    }
}

impl JoysoundFilter {
    pub fn admits(&self, composer: Option<&str>, page_url: &str) -> bool {
        composer.is_some_and(|c| self.permitted_composers.iter().any(|p| p == c))
            || self.url_allowlist.iter().any(|u| u == page_url)
    }
}

/// DAM listing rows are admitted when the description carries the required
/// keyword; artists on the exception list need it explicitly because their
/// catalogs mix in unrelated tie-in songs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamFilter {
    pub required_keyword: String,
    pub exception_artist_urls: Vec<String>,
    pub exception_words: Vec<String>,
}

impl Default for DamFilter {
    fn default() -> Self {
        Self {
            required_keyword: "東方".into(),
            exception_artist_urls: vec![
                "https://www.clubdam.com/karaokesearch/artistleaf.html?artistCode=43477".into(),
            ],
            exception_words: vec![
                "アニメ".into(),
                "ゲーム".into(),
                "映画".into(),
                "Windows".into(),
                "PlayStation".into(),
                "PS".into(),
                "Xbox".into(),
                "ニンテンドーDS".into(),
            ],
        }
    }
}

impl DamFilter {
    pub fn admits(&self, description: &str, artist_url: &str) -> bool {
        let flagged = self.exception_artist_urls.iter().any(|u| u == artist_url)
            || self.exception_words.iter().any(|w| description.contains(w));
        if flagged {
            description.contains(&self.required_keyword)
        } else {
            true
        }
    }
}

/// Vendor entry-point URLs.
pub mod joysound {
    pub const BASE_URL: &str = "https://www.joysound.com/web/";

    /// Genre listing for the themed catalog subset, oldest first.
    pub const GENRE_URL: &str = "https://www.joysound.com/web/search/song?searchType=3&genreCd=22800001&sortOrder=new&orderBy=asc&startIndex=0#songlist";

    pub const MUSIC_POST_BASE_URL: &str = "https://musicpost.joysound.com/";

    /// Music-post search listings for the two tracked composer keywords.
    pub const MUSIC_POST_SEARCH_URLS: [&str; 2] = [
        "https://musicpost.joysound.com/musicList/page:1?target=5&method=1&keyword=ZUN&detail_show_flg=false&original=on&cover=on&sort=1",
        "https://musicpost.joysound.com/musicList/page:1?target=5&method=1&keyword=%E3%81%82%E3%81%8D%E3%82%84%E3%81%BE%E3%81%86%E3%81%AB&detail_show_flg=false&original=on&cover=on&sort=1",
    ];

    /// Per-artist song listing option, newest first.
    pub const ARTIST_SONG_LIST_OPTION: &str = "?sortOrder=new&orderBy=desc&startIndex=0#songlist";
}

pub mod dam {
    pub const BASE_URL: &str = "https://www.clubdam.com/karaokesearch/";

    pub const SONG_URL_PREFIX: &str =
        "https://www.clubdam.com/karaokesearch/songleaf.html?requestNo=";

    /// Per-artist song listing option appended to an artist leaf URL.
    pub const ARTIST_SONG_LIST_OPTION: &str =
        "&contentsCode=&serviceCode=&serialNo=AT00001&filterTitle=&sort=3";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joysound_filter_admits_permitted_composer() {
        let filter = JoysoundFilter::default();
        assert!(filter.admits(Some("ZUN"), "https://www.joysound.com/web/search/song/1"));
        assert!(!filter.admits(Some("ARM"), "https://www.joysound.com/web/search/song/1"));
        assert!(filter.admits(None, "https://www.joysound.com/web/search/song/115474"));
        assert!(!filter.admits(None, "https://www.joysound.com/web/search/song/1"));
    }

    #[test]
    fn dam_filter_requires_keyword_for_flagged_rows() {
        let filter = DamFilter::default();
        // Plain fan-circle row passes without the keyword.
        assert!(filter.admits("同人サークルによるアレンジ", "https://example.com/a"));
        // Rows mentioning a tie-in word need the required keyword too.
        assert!(!filter.admits("ゲーム主題歌", "https://example.com/a"));
        assert!(filter.admits("東方Projectゲームアレンジ", "https://example.com/a"));
        // Exception artists always need the keyword.
        let flagged = &filter.exception_artist_urls[0].clone();
        assert!(!filter.admits("アレンジ楽曲", flagged));
        assert!(filter.admits("東方アレンジ楽曲", flagged));
    }

    #[tokio::test]
    async fn config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = AppConfig::load_or_create(&path).await.unwrap();
        assert_eq!(created.retry.max_attempts, 3);
        assert_eq!(created.maintenance.upcoming_window_days, 30);

        let reloaded = AppConfig::load_or_create(&path).await.unwrap();
        assert_eq!(reloaded.cache.ttl_minutes, created.cache.ttl_minutes);
    }
}
