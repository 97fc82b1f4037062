//! Per-vendor CSS selector tables.
//!
//! The target sites restructure their markup from time to time; keeping the
//! selectors in an external file lets operators repair extraction without a
//! code change. The defaults match the current page structures.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// All selector tables, one per page family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub joysound: JoysoundSelectors,
    pub music_post_list: MusicPostListSelectors,
    pub dam: DamSelectors,
}

impl SelectorConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read selector file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid selector file: {}", path.display()))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).await?;
        Ok(())
    }
}

/// Selectors for JOYSOUND song pages and music-post song pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoysoundSelectors {
    /// In-page error banner; its text marks a removed page.
    pub error: String,

    /// Text shown when the visited page no longer exists.
    pub missing_page_text: String,

    pub composer: String,
    pub artist: String,

    /// Song rows on a regular song page.
    pub songs: String,
    pub song_title: String,
    pub song_number: String,

    /// Delivery-model badges nested inside a song row.
    pub karaoke_platform: String,
    pub platform_item: String,
    pub platform_image: String,

    /// Song blocks on a music-post page.
    pub music_post_blocks: String,
    pub music_post_title: String,

    /// Artist heading used by the name-reading backfill pass.
    pub artist_reading: String,

    /// Per-artist song listing rows (music-post URL enrichment).
    pub artist_song_rows: String,
    pub artist_song_link: String,
    pub artist_song_title: String,
}

impl Default for JoysoundSelectors {
    fn default() -> Self {
        Self {
            error: "div.jp-cmp-error-text".into(),
            missing_page_text: "このページは存在しません。".into(),
            composer: "div.jp-cmp-song-visual dl.jp-cmp-song-composer dd".into(),
            artist: "div.jp-cmp-song-visual h2.jp-cmp-song-artist a".into(),
            songs: "#jp-cmp-karaoke-resultlist > div.jp-cmp-karaoke-block".into(),
            song_title: "div.jp-cmp-karaoke-details > h4".into(),
            song_number: "div.jp-cmp-karaoke-details span.jp-cmp-karaoke-number".into(),
            karaoke_platform: "ul.jp-cmp-karaoke-platform".into(),
            platform_item: "li".into(),
            platform_image: "img".into(),
            music_post_blocks: "#jp-cmp-karaoke-kyokupro > div.jp-cmp-kyokupuro-block".into(),
            music_post_title: "div.jp-cmp-karaoke-details > h4".into(),
            artist_reading:
                "#jp-cmp-main > section:nth-child(2) > header > div.jp-cmp-h1-003-title > h1 > span"
                    .into(),
            artist_song_rows:
                "#songlist > div.jp-cmp-music-list-001.jp-cmp-music-list-song-002 > ul > li".into(),
            artist_song_link: "a".into(),
            artist_song_title: "div > a > h3".into(),
        }
    }
}

/// Selectors for the paginated music-post search listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicPostListSelectors {
    pub blocks: String,
    pub link: String,
    pub title: String,
    pub artist: String,
    pub producer: String,
    pub deadline: String,

    /// Prefix stripped from the producer cell.
    pub producer_prefix: String,

    /// Prefix stripped from the deadline cell.
    pub deadline_prefix: String,

    /// Pager link; a page is last when no link starts with `next_text`.
    pub pager_links: String,
    pub next_text: String,
}

impl Default for MusicPostListSelectors {
    fn default() -> Self {
        Self {
            blocks: "#box_music_list_bottom > div.music_block".into(),
            link: "a".into(),
            title: "div > span.music_name".into(),
            artist: "div > span.artist_name".into(),
            producer: "div > span.producer_name".into(),
            deadline: "div > span.delivery_status".into(),
            producer_prefix: "配信ユーザー:".into(),
            deadline_prefix: "配信期限:".into(),
            pager_links: "#pager_bottom > div > a span.next_page.page.box".into(),
            next_text: "次へ".into(),
        }
    }
}

/// Selectors for DAM song leaf pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamSelectors {
    pub title: String,
    pub title_reading: String,
    pub song_number: String,
    pub artist: String,

    /// Newest delivery model, shown separately from the backlist.
    pub latest_model: String,
    pub model_list: String,

    /// Home-karaoke link; presence adds the synthetic delivery model.
    pub ouchikaraoke: String,

    /// Per-artist listing rows (song discovery).
    pub song_rows: String,
    pub song_name: String,
    pub song_link: String,
    pub description: String,
}

impl Default for DamSelectors {
    fn default() -> Self {
        Self {
            title: "#anchor-pagetop > main div.song-detail h2.song-name".into(),
            title_reading: "#anchor-pagetop > main div.song-detail span.song-name-kana".into(),
            song_number: "#anchor-pagetop > main div.song-detail div.request-no".into(),
            artist: "#anchor-pagetop > main div.song-detail div.artist-name a".into(),
            latest_model: "#anchor-pagetop > main div.delivery-models div.latest-model".into(),
            model_list: "#anchor-pagetop > main div.delivery-models ul.model-list > li".into(),
            ouchikaraoke: "#anchor-pagetop > main div.song-detail a.ouchikaraoke-link".into(),
            song_rows:
                "#anchor-pagetop > main > div > div > div.main-content > div.result-wrap > ul > li"
                    .into(),
            song_name: "div.result-item-inner > div.song-name".into(),
            song_link: "a".into(),
            description: "div.result-item-inner > div.description".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_css() {
        let config = SelectorConfig::default();
        for sel in [
            &config.joysound.composer,
            &config.joysound.artist,
            &config.joysound.songs,
            &config.joysound.music_post_blocks,
            &config.music_post_list.blocks,
            &config.dam.title,
            &config.dam.song_rows,
        ] {
            assert!(
                scraper::Selector::parse(sel).is_ok(),
                "selector does not parse: {sel}"
            );
        }
    }

    #[tokio::test]
    async fn selector_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selectors.json");

        let mut config = SelectorConfig::default();
        config.joysound.composer = "dd.composer".into();
        config.save(&path).await.unwrap();

        let loaded = SelectorConfig::load(&path).await.unwrap();
        assert_eq!(loaded.joysound.composer, "dd.composer");
        // Unspecified fields keep their defaults thanks to serde(default).
        assert_eq!(loaded.dam.title, DamSelectors::default().title);
    }
}
