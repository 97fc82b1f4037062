//! Music-post freshness maintenance.
//!
//! Four stages over the time-boxed music-post catalog:
//!
//! 1. cleanup: drop expired posts whose pages are confirmed gone
//! 2. fetch: re-scrape post song pages, priority order
//! 3. refresh: liveness-check catalog songs and drop confirmed-dead ones
//! 4. sync: push changed post deadlines into the song sidecars
//!
//! Deletion is gated on a confirmed `Missing` everywhere; an `Unknown`
//! probe result only ever skips.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::application::batch::process_in_parallel;
use crate::application::error_report::ErrorReporter;
use crate::application::scrapers::{MusicPostOutcome, SiteScraper};
use crate::domain::entities::{KaraokeSource, MusicPost};
use crate::domain::error::IngestError;
use crate::infrastructure::config::{BatchConfig, MaintenanceConfig};
use crate::infrastructure::store::CatalogStore;
use crate::infrastructure::url_checker::{Liveness, LivenessProbe};

/// Counters for one maintenance stage, plus its per-item error messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    pub checked: usize,
    /// Pages actually fetched from the vendor (fetch stage only).
    pub fetched: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Aggregate outcome of a full maintenance pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceReport {
    pub cleanup: StageStats,
    pub fetch: StageStats,
    pub refresh: StageStats,
    pub sync: StageStats,
}

/// Order posts for re-fetching: posts with no matched catalog song come
/// first in their original order, then posts whose deadline falls within
/// the upcoming window, nearest deadline first. Duplicates keep their
/// first position.
pub fn prioritize(
    posts: &[MusicPost],
    matched_song_urls: &HashSet<String>,
    today: NaiveDate,
    window_days: i64,
) -> Vec<MusicPost> {
    let is_matched = |post: &MusicPost| {
        post.song_page_url
            .as_deref()
            .is_some_and(|url| matched_song_urls.contains(url))
    };

    let unmatched = posts.iter().filter(|p| !is_matched(p));

    let window_end = today + chrono::Duration::days(window_days);
    let mut upcoming: Vec<&MusicPost> = posts
        .iter()
        .filter(|p| p.delivery_deadline >= today && p.delivery_deadline <= window_end)
        .collect();
    upcoming.sort_by_key(|p| p.delivery_deadline);

    let mut seen = HashSet::new();
    unmatched
        .chain(upcoming)
        .filter(|p| seen.insert(p.id))
        .cloned()
        .collect()
}

/// Runs the freshness stages over the music-post catalog.
pub struct MusicPostManager {
    store: Arc<dyn CatalogStore>,
    liveness: Arc<dyn LivenessProbe>,
    scraper: Arc<dyn SiteScraper>,
    reporter: Arc<ErrorReporter>,
    batch: BatchConfig,
    upcoming_window_days: i64,
}

impl MusicPostManager {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        liveness: Arc<dyn LivenessProbe>,
        scraper: Arc<dyn SiteScraper>,
        reporter: Arc<ErrorReporter>,
        batch: BatchConfig,
        maintenance: &MaintenanceConfig,
    ) -> Self {
        Self {
            store,
            liveness,
            scraper,
            reporter,
            batch,
            upcoming_window_days: maintenance.upcoming_window_days,
        }
    }

    /// Stage 1: delete expired posts whose source pages are confirmed gone,
    /// along with their matched catalog songs.
    pub async fn cleanup_expired(&self, today: NaiveDate) -> Result<StageStats, IngestError> {
        let mut stats = StageStats::default();
        let expired = self.store.expired_music_posts(today).await?;
        info!("cleanup: {} expired posts", expired.len());

        for post in expired {
            stats.checked += 1;
            match self.liveness.check(&post.source_url).await {
                Liveness::Missing { status } => {
                    info!("post '{}' gone ({status}), deleting", post.title);
                    if let Some(url) = post.song_page_url.as_deref() {
                        if let Some(song) = self
                            .store
                            .find_song_by_url(KaraokeSource::JoysoundMusicPost, url)
                            .await?
                        {
                            self.store.delete_song(song.id).await?;
                        }
                    }
                    self.store.delete_music_post(post.id).await?;
                    stats.deleted += 1;
                }
                Liveness::Exists { .. } => {
                    // Past its recorded deadline but still served; the fetch
                    // stage will pick up the extension.
                    stats.skipped += 1;
                }
                Liveness::Unknown { reason } => {
                    warn!("post '{}' liveness unknown ({reason}), keeping", post.title);
                    let err = IngestError::Unknown {
                        url: post.source_url.clone(),
                        reason,
                    };
                    self.reporter.record(&post.source_url, &err);
                    stats.errors.push(err.to_string());
                    stats.skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Stage 2: re-scrape post song pages in priority order.
    pub async fn fetch_prioritized(&self, today: NaiveDate) -> Result<StageStats, IngestError> {
        let mut stats = StageStats::default();
        let posts = self.store.all_music_posts().await?;
        let matched: HashSet<String> = self
            .store
            .song_urls(KaraokeSource::JoysoundMusicPost)
            .await?
            .into_iter()
            .collect();

        let ordered = prioritize(&posts, &matched, today, self.upcoming_window_days);
        let (ready, unresolved): (Vec<MusicPost>, Vec<MusicPost>) = ordered
            .into_iter()
            .partition(|p| p.song_page_url.is_some());
        stats.skipped += unresolved.len();
        stats.checked = ready.len() + unresolved.len();

        let updated = Arc::new(AtomicUsize::new(0));
        let deleted = Arc::new(AtomicUsize::new(0));
        let scraper = self.scraper.clone();
        let reporter = self.reporter.clone();
        let (u, d) = (updated.clone(), deleted.clone());
        let outcome = process_in_parallel(ready, &self.batch, move |post| {
            let scraper = scraper.clone();
            let reporter = reporter.clone();
            let (u, d) = (u.clone(), d.clone());
            async move {
                let url = post
                    .song_page_url
                    .clone()
                    .unwrap_or_else(|| post.source_url.clone());
                match scraper.scrape_music_post_page(&post).await {
                    Ok(MusicPostOutcome::Updated(_)) => {
                        u.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                    Ok(MusicPostOutcome::Removed) => {
                        d.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                    Err(e) => {
                        reporter.record(&url, &e);
                        Err(e)
                    }
                }
            }
        })
        .await;

        stats.updated = updated.load(Ordering::SeqCst);
        stats.deleted = deleted.load(Ordering::SeqCst);
        stats.fetched = stats.updated + stats.deleted;
        stats.errors = outcome.errors.into_iter().map(|(_, msg)| msg).collect();
        Ok(stats)
    }

    /// Stage 3: probe every catalog song page and drop confirmed-dead ones.
    pub async fn refresh_existing(&self) -> Result<StageStats, IngestError> {
        let mut stats = StageStats::default();
        let songs = self
            .store
            .songs_by_source(KaraokeSource::JoysoundMusicPost)
            .await?;
        info!("refresh: {} catalog songs", songs.len());

        for song in songs {
            stats.checked += 1;
            match self.liveness.check(&song.url).await {
                Liveness::Missing { status } => {
                    info!("song '{}' gone ({status}), deleting", song.title);
                    self.store.delete_song(song.id).await?;
                    stats.deleted += 1;
                }
                Liveness::Exists { .. } => {}
                Liveness::Unknown { reason } => {
                    warn!("song '{}' liveness unknown ({reason}), keeping", song.title);
                    let err = IngestError::Unknown {
                        url: song.url.clone(),
                        reason,
                    };
                    self.reporter.record(&song.url, &err);
                    stats.errors.push(err.to_string());
                    stats.skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Stage 4: push changed post deadlines into the matched song sidecars.
    pub async fn sync_deadlines(&self) -> Result<StageStats, IngestError> {
        let mut stats = StageStats::default();
        let deadlines = self.store.music_post_deadlines().await?;

        for (song, sidecar) in self.store.songs_with_deadlines().await? {
            stats.checked += 1;
            match deadlines.get(&sidecar.source_url) {
                Some(current) if *current != sidecar.deadline => {
                    self.store
                        .upsert_song_deadline(song.id, *current, &sidecar.source_url)
                        .await?;
                    stats.updated += 1;
                }
                Some(_) => {}
                None => {
                    // Post is gone; cleanup owns that case.
                    stats.skipped += 1;
                }
            }
        }
        Ok(stats)
    }

    /// Run all four stages in order and aggregate the counters.
    pub async fn perform_full_maintenance(
        &self,
        today: NaiveDate,
    ) -> Result<MaintenanceReport, IngestError> {
        let cleanup = self.cleanup_expired(today).await?;
        let fetch = self.fetch_prioritized(today).await?;
        let refresh = self.refresh_existing().await?;
        let sync = self.sync_deadlines().await?;
        let report = MaintenanceReport {
            cleanup,
            fetch,
            refresh,
            sync,
        };
        info!(
            "maintenance done: cleanup -{}, fetch ~{}, refresh -{}, sync ~{}",
            report.cleanup.deleted, report.fetch.updated, report.refresh.deleted, report.sync.updated
        );
        Ok(report)
    }
}
