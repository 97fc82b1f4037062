//! Site scrapers.
//!
//! Each scraper drives a browser session to a vendor page, hands the
//! rendered DOM to the parsers, and reconciles the result into the store.
//! Delivery-model associations are always reconciled as a diff against the
//! current set; a wholesale replace would briefly drop rows another worker
//! just added.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::delivery_model_cache::DeliveryModelCache;
use crate::application::parsing::{
    self, normalize_ws, parse_artist_reading, parse_artist_song_rows, parse_dam_artist_rows,
    parse_dam_song_page, parse_joysound_song_page, parse_music_post_list,
    parse_music_post_song_page,
};
use crate::domain::entities::{KaraokeSource, MusicPost, NewMusicPost, NewSong, Song};
use crate::domain::error::{IngestError, SessionError};
use crate::infrastructure::browser_session::{BrowserSession, BrowserSessionConfig};
use crate::infrastructure::config::{dam, joysound, DamFilter, JoysoundFilter};
use crate::infrastructure::retry::with_retry;
use crate::infrastructure::selectors::{
    DamSelectors, JoysoundSelectors, MusicPostListSelectors,
};
use crate::infrastructure::store::CatalogStore;

/// Result of refreshing one music post's song page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MusicPostOutcome {
    /// The page still exists; these songs were upserted.
    Updated(Vec<Song>),
    /// The page carried the removed marker; song and post were deleted.
    Removed,
}

/// Scraping seam the freshness manager depends on; tests substitute stubs.
#[async_trait]
pub trait SiteScraper: Send + Sync {
    /// Scrape one song page and reconcile its songs into the store.
    /// Pages rejected by the vendor filter yield an empty list.
    async fn scrape_song_page(&self, url: &str) -> Result<Vec<Song>, IngestError>;

    /// Re-fetch the song page behind a music post and reconcile it.
    async fn scrape_music_post_page(
        &self,
        post: &MusicPost,
    ) -> Result<MusicPostOutcome, IngestError>;

    /// Re-fetch one song's live page and re-derive its delivery-model set
    /// from what the vendor currently serves.
    async fn update_delivery_models(&self, song: &Song) -> Result<(), IngestError>;
}

/// Set difference in both directions: what to add, what to remove.
pub fn association_diff(current: &[i64], desired: &[i64]) -> (Vec<i64>, Vec<i64>) {
    let to_add = desired
        .iter()
        .filter(|id| !current.contains(id))
        .copied()
        .collect();
    let to_remove = current
        .iter()
        .filter(|id| !desired.contains(id))
        .copied()
        .collect();
    (to_add, to_remove)
}

/// Apply an association diff. An already-present row on add is another
/// worker's win, not a failure.
pub async fn apply_association_diff(
    store: &dyn CatalogStore,
    song_id: i64,
    to_add: &[i64],
    to_remove: &[i64],
) -> Result<(), IngestError> {
    for model_id in to_add {
        match store.add_song_delivery_model(song_id, *model_id).await {
            Ok(()) => {}
            Err(e) if e.is_unique_violation() => {
                debug!("association song={song_id} model={model_id} already present");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if !to_remove.is_empty() {
        store.remove_song_delivery_models(song_id, to_remove).await?;
    }
    Ok(())
}

/// Bring a song's delivery-model set in line with the names just scraped.
pub async fn reconcile_delivery_models(
    store: &dyn CatalogStore,
    cache: &DeliveryModelCache,
    song_id: i64,
    model_names: &[String],
    source: KaraokeSource,
) -> Result<(), IngestError> {
    let desired = cache.find_or_create_ids(model_names, source).await?;
    let current = store.song_delivery_model_ids(song_id).await?;
    let (to_add, to_remove) = association_diff(&current, &desired);
    if !to_add.is_empty() || !to_remove.is_empty() {
        debug!(
            "song {song_id}: +{} -{} delivery models",
            to_add.len(),
            to_remove.len()
        );
    }
    apply_association_diff(store, song_id, &to_add, &to_remove).await
}

/// Genre listing page URL for one pagination offset.
fn genre_page_url(start_index: usize) -> String {
    joysound::GENRE_URL.replace("startIndex=0", &format!("startIndex={start_index}"))
}

/// Fetch a URL through a fresh-per-call browser session, retrying transient
/// failures with a relaunched session. Returns the rendered HTML and the
/// URL the browser ended up on.
async fn fetch_rendered(
    config: &BrowserSessionConfig,
    max_attempts: u32,
    url: &str,
) -> Result<(String, String), IngestError> {
    let slot: Mutex<Option<BrowserSession>> = Mutex::new(None);
    let slot_ref = &slot;

    let result = with_retry(
        max_attempts,
        move || async move {
            let mut guard = slot_ref.lock().await;
            if guard.is_none() {
                *guard = Some(BrowserSession::launch(config).await?);
            }
            let session = guard.as_ref().ok_or(SessionError::Closed)?;
            session.visit(url).await?;
            let html = session.html().await?;
            let landed = session.current_url().await?;
            Ok((html, landed))
        },
        move |err, attempt| {
            warn!("discarding session after attempt {attempt}: {err}");
            async move {
                if let Some(mut session) = slot_ref.lock().await.take() {
                    session.close().await;
                }
            }
        },
    )
    .await;

    if let Some(mut session) = slot.lock().await.take() {
        session.close().await;
    }
    result
}

/// Scraper for JOYSOUND song pages, music-post pages, and the music-post
/// search listing.
pub struct JoysoundScraper {
    store: Arc<dyn CatalogStore>,
    cache: Arc<DeliveryModelCache>,
    selectors: JoysoundSelectors,
    list_selectors: MusicPostListSelectors,
    session_config: BrowserSessionConfig,
    max_attempts: u32,
    filter: JoysoundFilter,
}

impl JoysoundScraper {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<DeliveryModelCache>,
        selectors: JoysoundSelectors,
        list_selectors: MusicPostListSelectors,
        session_config: BrowserSessionConfig,
        max_attempts: u32,
        filter: JoysoundFilter,
    ) -> Self {
        Self {
            store,
            cache,
            selectors,
            list_selectors,
            session_config,
            max_attempts,
            filter,
        }
    }

    async fn fetch(&self, url: &str) -> Result<(String, String), IngestError> {
        fetch_rendered(&self.session_config, self.max_attempts, url).await
    }

    /// Walk the music-post search listings and upsert every entry found.
    /// Returns the number of posts seen.
    pub async fn fetch_music_posts(&self) -> Result<usize, IngestError> {
        let mut seen = 0;
        for search_url in joysound::MUSIC_POST_SEARCH_URLS {
            let mut page_no = 1;
            loop {
                let url = search_url.replace("page:1", &format!("page:{page_no}"));
                let (html, _) = self.fetch(&url).await?;
                let page = parse_music_post_list(
                    &html,
                    joysound::MUSIC_POST_BASE_URL,
                    &self.list_selectors,
                )?;

                for item in &page.items {
                    self.store
                        .upsert_music_post(&NewMusicPost {
                            title: item.title.clone(),
                            artist_name: item.artist_name.clone(),
                            producer: item.producer.clone(),
                            delivery_deadline: item.delivery_deadline,
                            source_url: item.url.clone(),
                        })
                        .await?;
                    seen += 1;
                }

                if !page.has_next {
                    break;
                }
                page_no += 1;
            }
        }
        info!("music-post listing walk complete: {seen} posts");
        Ok(seen)
    }

    /// Match pending posts (no song page yet) against per-artist song
    /// listings and record the song page URL. Returns how many resolved.
    pub async fn resolve_song_page_urls(&self) -> Result<usize, IngestError> {
        let pending = self.store.pending_music_posts().await?;
        if pending.is_empty() {
            return Ok(0);
        }
        // Post artists carry no page URL of their own; the regular
        // JOYSOUND artist records do.
        let artists = self.store.artists_by_source(KaraokeSource::Joysound).await?;

        let mut resolved = 0;
        for artist in &artists {
            let Some(artist_url) = artist.url.as_deref() else {
                continue;
            };
            let posts: Vec<&MusicPost> = pending
                .iter()
                .filter(|p| normalize_ws(&p.artist_name) == normalize_ws(&artist.name))
                .collect();
            if posts.is_empty() {
                continue;
            }

            let listing_url = format!("{artist_url}{}", joysound::ARTIST_SONG_LIST_OPTION);
            let (html, _) = self.fetch(&listing_url).await?;
            let rows = parse_artist_song_rows(&html, joysound::BASE_URL, &self.selectors)?;

            for post in posts {
                let wanted = normalize_ws(&post.title);
                // Listing titles may carry a reading suffix after a slash.
                let matched = rows.iter().find(|row| {
                    let head = row.title.split('／').next().unwrap_or(&row.title);
                    normalize_ws(head) == wanted
                });
                if let Some(row) = matched {
                    self.store
                        .set_music_post_song_page_url(post.id, &row.url)
                        .await?;
                    resolved += 1;
                }
            }
        }
        info!("resolved song page urls for {resolved} music posts");
        Ok(resolved)
    }

    /// Page through the genre listing and collect song page URLs not yet
    /// in the catalog. The caller feeds these to `scrape_song_page`,
    /// usually through the batch orchestrator.
    pub async fn discover_song_urls(&self) -> Result<Vec<String>, IngestError> {
        let known: HashSet<String> = self
            .store
            .song_urls(KaraokeSource::Joysound)
            .await?
            .into_iter()
            .collect();

        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        let mut start_index = 0;
        loop {
            let (html, _) = self.fetch(&genre_page_url(start_index)).await?;
            let rows = parse_artist_song_rows(&html, joysound::BASE_URL, &self.selectors)?;
            if rows.is_empty() {
                break;
            }
            let before = seen.len();
            start_index += rows.len();
            for row in rows {
                if seen.insert(row.url.clone()) && !known.contains(&row.url) {
                    urls.push(row.url);
                }
            }
            if seen.len() == before {
                // The listing clamps startIndex past the end and serves
                // the last page again.
                break;
            }
        }
        info!("joysound discovery: {} candidate song pages", urls.len());
        Ok(urls)
    }

    /// Backfill `name_reading` for artists that still lack one.
    pub async fn backfill_artist_readings(&self) -> Result<usize, IngestError> {
        let mut updated = 0;
        for source in [KaraokeSource::Joysound, KaraokeSource::JoysoundMusicPost] {
            for artist in self.store.artists_missing_reading(source).await? {
                let Some(url) = artist.url.as_deref() else {
                    continue;
                };
                let (html, _) = self.fetch(url).await?;
                if let Some(reading) = parse_artist_reading(&html, &self.selectors) {
                    self.store.set_artist_reading(artist.id, &reading).await?;
                    updated += 1;
                }
            }
        }
        Ok(updated)
    }

    async fn upsert_rows(
        &self,
        rows: &[parsing::JoysoundSongRow],
        source: KaraokeSource,
        page_url: &str,
        artist_id: i64,
    ) -> Result<Vec<Song>, IngestError> {
        let mut songs = Vec::with_capacity(rows.len());
        for row in rows {
            let song = self
                .store
                .upsert_song(&NewSong {
                    title: row.title.clone(),
                    title_reading: None,
                    song_number: row.song_number.clone(),
                    source,
                    url: page_url.to_string(),
                    artist_id,
                })
                .await?;
            reconcile_delivery_models(
                self.store.as_ref(),
                &self.cache,
                song.id,
                &row.delivery_models,
                source,
            )
            .await?;
            songs.push(song);
        }
        Ok(songs)
    }
}

#[async_trait]
impl SiteScraper for JoysoundScraper {
    async fn scrape_song_page(&self, url: &str) -> Result<Vec<Song>, IngestError> {
        let (html, landed) = self.fetch(url).await?;
        if parsing::page_missing(&html, &self.selectors) {
            return Err(IngestError::ConfirmedAbsent { url: landed });
        }
        let page = parse_joysound_song_page(&html, &self.selectors)?;

        if !self.filter.admits(page.composer.as_deref(), &landed) {
            debug!("filtered out {landed} (composer {:?})", page.composer);
            return Ok(Vec::new());
        }

        let artist_url = page
            .artist_url
            .as_deref()
            .map(|href| match url::Url::parse(joysound::BASE_URL) {
                Ok(base) => base
                    .join(href)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| href.to_string()),
                Err(_) => href.to_string(),
            });
        let artist = self
            .store
            .find_or_create_artist(&page.artist_name, KaraokeSource::Joysound, artist_url.as_deref())
            .await?;

        self.upsert_rows(&page.songs, KaraokeSource::Joysound, &landed, artist.id)
            .await
    }

    async fn scrape_music_post_page(
        &self,
        post: &MusicPost,
    ) -> Result<MusicPostOutcome, IngestError> {
        let url = post
            .song_page_url
            .as_deref()
            .ok_or_else(|| IngestError::Validation("music post has no song page url".into()))?;

        let (html, landed) = self.fetch(url).await?;
        let page = parse_music_post_song_page(&html, &self.selectors)?;

        if page.missing {
            // The vendor removed the page: retire the matched song (the
            // sidecars cascade) and the post itself.
            if let Some(song) = self
                .store
                .find_song_by_url(KaraokeSource::JoysoundMusicPost, &landed)
                .await?
                .or(self
                    .store
                    .find_song_by_url(KaraokeSource::JoysoundMusicPost, url)
                    .await?)
            {
                info!("music-post song page gone, deleting song {}", song.id);
                self.store.delete_song(song.id).await?;
            }
            self.store.delete_music_post(post.id).await?;
            return Ok(MusicPostOutcome::Removed);
        }

        let artist_name = page.artist_name.as_deref().unwrap_or(&post.artist_name);
        let artist = self
            .store
            .find_or_create_artist(artist_name, KaraokeSource::JoysoundMusicPost, None)
            .await?;
        let songs = self
            .upsert_rows(&page.songs, KaraokeSource::JoysoundMusicPost, url, artist.id)
            .await?;

        // Deadline sidecar, written only when the date actually moved.
        for song in &songs {
            let stale = match self.store.song_deadline(song.id).await? {
                Some(existing) => existing.deadline != post.delivery_deadline,
                None => true,
            };
            if stale {
                self.store
                    .upsert_song_deadline(song.id, post.delivery_deadline, &post.source_url)
                    .await?;
            }
        }

        Ok(MusicPostOutcome::Updated(songs))
    }

    async fn update_delivery_models(&self, song: &Song) -> Result<(), IngestError> {
        let (html, _) = self.fetch(&song.url).await?;
        if parsing::page_missing(&html, &self.selectors) {
            return Err(IngestError::ConfirmedAbsent {
                url: song.url.clone(),
            });
        }
        // Music-post pages and regular song pages list their rows under
        // different containers.
        let rows = match song.source {
            KaraokeSource::JoysoundMusicPost => {
                parse_music_post_song_page(&html, &self.selectors)?.songs
            }
            _ => parse_joysound_song_page(&html, &self.selectors)?.songs,
        };
        let row = parsing::find_song_row(&rows, &song.title, song.song_number.as_deref())
            .ok_or_else(|| {
                IngestError::Validation(format!(
                    "song '{}' no longer listed on {}",
                    song.title, song.url
                ))
            })?;
        reconcile_delivery_models(
            self.store.as_ref(),
            &self.cache,
            song.id,
            &row.delivery_models,
            song.source,
        )
        .await
    }
}

/// Scraper for DAM song leaf pages and per-artist listings.
pub struct DamScraper {
    store: Arc<dyn CatalogStore>,
    cache: Arc<DeliveryModelCache>,
    selectors: DamSelectors,
    session_config: BrowserSessionConfig,
    max_attempts: u32,
    filter: DamFilter,
}

impl DamScraper {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        cache: Arc<DeliveryModelCache>,
        selectors: DamSelectors,
        session_config: BrowserSessionConfig,
        max_attempts: u32,
        filter: DamFilter,
    ) -> Self {
        Self {
            store,
            cache,
            selectors,
            session_config,
            max_attempts,
            filter,
        }
    }

    async fn fetch(&self, url: &str) -> Result<(String, String), IngestError> {
        fetch_rendered(&self.session_config, self.max_attempts, url).await
    }

    /// Walk every known DAM artist's listing and collect the song leaf URLs
    /// that pass the vendor filter. The caller feeds these to
    /// `scrape_song_page`, usually through the batch orchestrator.
    pub async fn discover_song_urls(&self) -> Result<Vec<String>, IngestError> {
        let artists = self.store.artists_by_source(KaraokeSource::Dam).await?;
        let mut urls = Vec::new();
        for artist in &artists {
            let Some(artist_url) = artist.url.as_deref() else {
                continue;
            };
            let listing_url = format!("{artist_url}{}", dam::ARTIST_SONG_LIST_OPTION);
            let (html, _) = self.fetch(&listing_url).await?;
            let rows = parse_dam_artist_rows(&html, dam::BASE_URL, &self.selectors)?;
            for row in rows {
                if self.filter.admits(&row.description, artist_url) {
                    urls.push(row.url);
                } else {
                    debug!("filtered out {} ({})", row.title, row.description);
                }
            }
        }
        info!("dam discovery: {} candidate song pages", urls.len());
        Ok(urls)
    }
}

/// Synthetic delivery model recorded when a DAM song offers home karaoke.
pub const OUCHIKARAOKE_MODEL: &str = "カラオケ@DAM";

#[async_trait]
impl SiteScraper for DamScraper {
    async fn scrape_song_page(&self, url: &str) -> Result<Vec<Song>, IngestError> {
        let (html, landed) = self.fetch(url).await?;
        let page = parse_dam_song_page(&html, dam::BASE_URL, &self.selectors)?;

        let artist = self
            .store
            .find_or_create_artist(&page.artist_name, KaraokeSource::Dam, page.artist_url.as_deref())
            .await?;
        let song = self
            .store
            .upsert_song(&NewSong {
                title: page.title.clone(),
                title_reading: page.title_reading.clone(),
                song_number: page.song_number.clone(),
                source: KaraokeSource::Dam,
                url: landed,
                artist_id: artist.id,
            })
            .await?;

        let mut model_names = page.delivery_models.clone();
        if page.ouchikaraoke_url.is_some() {
            model_names.push(OUCHIKARAOKE_MODEL.to_string());
        }
        reconcile_delivery_models(
            self.store.as_ref(),
            &self.cache,
            song.id,
            &model_names,
            KaraokeSource::Dam,
        )
        .await?;
        self.store
            .set_ouchikaraoke_url(song.id, page.ouchikaraoke_url.as_deref())
            .await?;

        Ok(vec![song])
    }

    async fn scrape_music_post_page(
        &self,
        _post: &MusicPost,
    ) -> Result<MusicPostOutcome, IngestError> {
        Err(IngestError::Validation(
            "music posts are a JOYSOUND feature".into(),
        ))
    }

    async fn update_delivery_models(&self, song: &Song) -> Result<(), IngestError> {
        let (html, _) = self.fetch(&song.url).await?;
        let page = parse_dam_song_page(&html, dam::BASE_URL, &self.selectors)?;

        let mut model_names = page.delivery_models;
        if page.ouchikaraoke_url.is_some() {
            model_names.push(OUCHIKARAOKE_MODEL.to_string());
        }
        reconcile_delivery_models(
            self.store.as_ref(),
            &self.cache,
            song.id,
            &model_names,
            KaraokeSource::Dam,
        )
        .await?;
        self.store
            .set_ouchikaraoke_url(song.id, page.ouchikaraoke_url.as_deref())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::CacheConfig;
    use crate::infrastructure::store::SqliteCatalogStore;

    #[test]
    fn genre_page_url_advances_only_the_start_index() {
        let url = genre_page_url(60);
        assert!(url.contains("startIndex=60"));
        assert!(url.contains("genreCd=22800001"));
        assert!(url.ends_with("#songlist"));
        assert_eq!(genre_page_url(0), joysound::GENRE_URL);
    }

    #[test]
    fn diff_is_empty_when_sets_match() {
        let (add, remove) = association_diff(&[1, 2, 3], &[3, 2, 1]);
        assert!(add.is_empty());
        assert!(remove.is_empty());
    }

    #[test]
    fn diff_adds_and_removes_only_the_delta() {
        let (add, remove) = association_diff(&[1, 2], &[2, 3]);
        assert_eq!(add, vec![3]);
        assert_eq!(remove, vec![1]);
    }

    async fn seeded_song(store: &SqliteCatalogStore) -> Song {
        let artist = store
            .find_or_create_artist("ZUN", KaraokeSource::Joysound, None)
            .await
            .unwrap();
        store
            .upsert_song(&NewSong {
                title: "U.N.オーエンは彼女なのか?".into(),
                title_reading: None,
                song_number: None,
                source: KaraokeSource::Joysound,
                url: "https://www.joysound.com/web/search/song/1".into(),
                artist_id: artist.id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn concurrent_addition_survives_stale_diff() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCatalogStore::connect(&dir.path().join("diff.db"))
            .await
            .unwrap();
        let song = seeded_song(&store).await;

        let a = store
            .create_delivery_model("A", KaraokeSource::Joysound)
            .await
            .unwrap();
        let b = store
            .create_delivery_model("B", KaraokeSource::Joysound)
            .await
            .unwrap();
        let c = store
            .create_delivery_model("C", KaraokeSource::Joysound)
            .await
            .unwrap();
        let d = store
            .create_delivery_model("D", KaraokeSource::Joysound)
            .await
            .unwrap();

        store.add_song_delivery_model(song.id, a).await.unwrap();
        store.add_song_delivery_model(song.id, b).await.unwrap();

        // Diff computed from a snapshot taken before D lands.
        let snapshot = store.song_delivery_model_ids(song.id).await.unwrap();
        let (to_add, to_remove) = association_diff(&snapshot, &[b, c]);

        // Another worker adds D between snapshot and apply.
        store.add_song_delivery_model(song.id, d).await.unwrap();

        apply_association_diff(&store, song.id, &to_add, &to_remove)
            .await
            .unwrap();

        let mut after = store.song_delivery_model_ids(song.id).await.unwrap();
        after.sort_unstable();
        let mut expected = vec![b, c, d];
        expected.sort_unstable();
        assert_eq!(after, expected);
    }

    #[tokio::test]
    async fn reconcile_converges_on_scraped_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteCatalogStore::connect(&dir.path().join("reconcile.db"))
                .await
                .unwrap(),
        );
        let cache = DeliveryModelCache::new(store.clone(), &CacheConfig { ttl_minutes: 60 });
        let song = seeded_song(store.as_ref()).await;

        let names = vec!["JOYSOUND MAX GO".to_string(), "JOYSOUND MAX2".to_string()];
        reconcile_delivery_models(
            store.as_ref(),
            &cache,
            song.id,
            &names,
            KaraokeSource::Joysound,
        )
        .await
        .unwrap();
        assert_eq!(
            store.song_delivery_model_ids(song.id).await.unwrap().len(),
            2
        );

        // The vendor dropped MAX2; reconciliation removes just that one.
        let names = vec!["JOYSOUND MAX GO".to_string()];
        reconcile_delivery_models(
            store.as_ref(),
            &cache,
            song.id,
            &names,
            KaraokeSource::Joysound,
        )
        .await
        .unwrap();
        assert_eq!(
            store.song_delivery_model_ids(song.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn dam_scraper_rejects_music_posts() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            SqliteCatalogStore::connect(&dir.path().join("dam.db"))
                .await
                .unwrap(),
        );
        let cache = Arc::new(DeliveryModelCache::new(
            store.clone(),
            &CacheConfig { ttl_minutes: 60 },
        ));
        let scraper = DamScraper::new(
            store,
            cache,
            DamSelectors::default(),
            BrowserSessionConfig::default(),
            3,
            DamFilter::default(),
        );
        let post = MusicPost {
            id: 1,
            title: "t".into(),
            artist_name: "a".into(),
            producer: "p".into(),
            delivery_deadline: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            source_url: "https://musicpost.joysound.com/post/1".into(),
            song_page_url: None,
        };
        let err = scraper.scrape_music_post_page(&post).await.unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
    }
}
