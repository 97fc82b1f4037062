//! Catalog entities produced and reconciled by the ingestion pipeline.
//!
//! Persistence itself lives behind `infrastructure::store::CatalogStore`;
//! these types carry the natural keys the scrapers upsert by.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Vendor tag for every scraped record.
///
/// The music-post catalog is treated as its own source: those songs are
/// reached through promotional listings rather than the regular JOYSOUND
/// search pages, and they expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KaraokeSource {
    Joysound,
    JoysoundMusicPost,
    Dam,
}

impl KaraokeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Joysound => "JOYSOUND",
            Self::JoysoundMusicPost => "JOYSOUND(うたスキ)",
            Self::Dam => "DAM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "JOYSOUND" => Some(Self::Joysound),
            "JOYSOUND(うたスキ)" => Some(Self::JoysoundMusicPost),
            "DAM" => Some(Self::Dam),
            _ => None,
        }
    }
}

impl std::fmt::Display for KaraokeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An artist as displayed by a vendor. Created on first sighting by any
/// scraper; `name_reading` is backfilled by a later pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayArtist {
    pub id: i64,
    pub name: String,
    pub name_reading: Option<String>,
    pub source: KaraokeSource,
    pub url: Option<String>,
}

/// A catalog song. Identity is the full natural tuple because several
/// JOYSOUND songs share one artist page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub title_reading: Option<String>,
    pub song_number: Option<String>,
    pub source: KaraokeSource,
    pub url: String,
    pub artist_id: i64,
}

/// Upsert payload for a song; the store resolves it against the natural key
/// `(source, url, artist_id, title, song_number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub title: String,
    pub title_reading: Option<String>,
    pub song_number: Option<String>,
    pub source: KaraokeSource,
    pub url: String,
    pub artist_id: i64,
}

/// A delivery model (karaoke machine generation) a song is available on.
/// Identity is the normalized `(name, source)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KaraokeDeliveryModel {
    pub id: i64,
    pub name: String,
    pub source: KaraokeSource,
    pub display_order: Option<i64>,
}

/// A time-boxed promotional listing scraped from the music-post catalog.
/// `song_page_url` starts empty and is filled by a separate enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicPost {
    pub id: i64,
    pub title: String,
    pub artist_name: String,
    pub producer: String,
    pub delivery_deadline: NaiveDate,
    pub source_url: String,
    pub song_page_url: Option<String>,
}

/// Upsert payload for a music post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMusicPost {
    pub title: String,
    pub artist_name: String,
    pub producer: String,
    pub delivery_deadline: NaiveDate,
    pub source_url: String,
}

/// One-to-one sidecar carrying a music post's expiry date on the matched
/// song. Kept in sync by the freshness manager, deleted with its song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDeadline {
    pub song_id: i64,
    pub deadline: NaiveDate,
    pub source_url: String,
}

/// Status of a named resumable run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Processing,
    Completed,
    Interrupted,
}

/// Per-item failure recorded in a run checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunItemError {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_tag_round_trips() {
        for source in [
            KaraokeSource::Joysound,
            KaraokeSource::JoysoundMusicPost,
            KaraokeSource::Dam,
        ] {
            assert_eq!(KaraokeSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(KaraokeSource::parse("UGA"), None);
    }
}
