//! Catalog persistence.
//!
//! `CatalogStore` is the seam the pipeline talks through: upsert-by-natural-
//! key for every entity, pluck-style queries for the freshness diffs, and
//! association add/remove for the song↔delivery-model set. The SQLite
//! implementation backs production; tests either use it against a temp file
//! or substitute the trait.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::domain::entities::{
    DisplayArtist, KaraokeDeliveryModel, KaraokeSource, MusicPost, NewMusicPost, NewSong, Song,
    SongDeadline,
};
use crate::domain::error::StoreError;

/// Persistence operations the ingestion core needs from the catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    // Artists
    async fn find_or_create_artist(
        &self,
        name: &str,
        source: KaraokeSource,
        url: Option<&str>,
    ) -> Result<DisplayArtist, StoreError>;
    async fn artists_by_source(&self, source: KaraokeSource)
        -> Result<Vec<DisplayArtist>, StoreError>;
    async fn artists_missing_reading(
        &self,
        source: KaraokeSource,
    ) -> Result<Vec<DisplayArtist>, StoreError>;
    async fn set_artist_reading(&self, artist_id: i64, reading: &str) -> Result<(), StoreError>;

    // Songs
    async fn upsert_song(&self, song: &NewSong) -> Result<Song, StoreError>;
    async fn find_song_by_url(
        &self,
        source: KaraokeSource,
        url: &str,
    ) -> Result<Option<Song>, StoreError>;
    async fn songs_by_source(&self, source: KaraokeSource) -> Result<Vec<Song>, StoreError>;
    async fn song_urls(&self, source: KaraokeSource) -> Result<Vec<String>, StoreError>;
    async fn delete_song(&self, song_id: i64) -> Result<(), StoreError>;

    // Delivery models
    async fn all_delivery_models(&self) -> Result<Vec<KaraokeDeliveryModel>, StoreError>;
    async fn find_delivery_model_id(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<Option<i64>, StoreError>;
    /// Fails with [`StoreError::UniqueViolation`] when a concurrent writer
    /// created the same `(name, source)` first.
    async fn create_delivery_model(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<i64, StoreError>;

    // Song ↔ delivery-model associations
    async fn song_delivery_model_ids(&self, song_id: i64) -> Result<Vec<i64>, StoreError>;
    /// Fails with [`StoreError::UniqueViolation`] when the association
    /// already exists; callers treat that as already-added.
    async fn add_song_delivery_model(&self, song_id: i64, model_id: i64)
        -> Result<(), StoreError>;
    async fn remove_song_delivery_models(
        &self,
        song_id: i64,
        model_ids: &[i64],
    ) -> Result<(), StoreError>;

    // Music posts
    async fn upsert_music_post(&self, post: &NewMusicPost) -> Result<MusicPost, StoreError>;
    async fn all_music_posts(&self) -> Result<Vec<MusicPost>, StoreError>;
    async fn pending_music_posts(&self) -> Result<Vec<MusicPost>, StoreError>;
    async fn expired_music_posts(&self, before: NaiveDate) -> Result<Vec<MusicPost>, StoreError>;
    async fn music_post_deadlines(&self) -> Result<HashMap<String, NaiveDate>, StoreError>;
    async fn find_music_post_by_artist_title(
        &self,
        artist_name: &str,
        title: &str,
    ) -> Result<Option<MusicPost>, StoreError>;
    async fn set_music_post_song_page_url(
        &self,
        post_id: i64,
        url: &str,
    ) -> Result<(), StoreError>;
    async fn delete_music_post(&self, post_id: i64) -> Result<(), StoreError>;

    // Deadline sidecar
    async fn song_deadline(&self, song_id: i64) -> Result<Option<SongDeadline>, StoreError>;
    async fn upsert_song_deadline(
        &self,
        song_id: i64,
        deadline: NaiveDate,
        source_url: &str,
    ) -> Result<(), StoreError>;
    async fn songs_with_deadlines(&self) -> Result<Vec<(Song, SongDeadline)>, StoreError>;

    // Home-karaoke sidecar (DAM)
    async fn ouchikaraoke_url(&self, song_id: i64) -> Result<Option<String>, StoreError>;
    async fn set_ouchikaraoke_url(
        &self,
        song_id: i64,
        url: Option<&str>,
    ) -> Result<(), StoreError>;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS display_artists (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    name_reading TEXT NOT NULL DEFAULT '',
    source       TEXT NOT NULL,
    -- '' stands for "no url known"; NULLs are distinct in a unique index
    -- and would let concurrent writers duplicate url-less artists.
    url          TEXT NOT NULL DEFAULT '',
    UNIQUE(source, name, url)
);

CREATE TABLE IF NOT EXISTS songs (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    title         TEXT NOT NULL,
    title_reading TEXT NOT NULL DEFAULT '',
    song_number   TEXT NOT NULL DEFAULT '',
    source        TEXT NOT NULL,
    url           TEXT NOT NULL,
    artist_id     INTEGER NOT NULL REFERENCES display_artists(id),
    UNIQUE(source, url, artist_id, title, song_number)
);

CREATE TABLE IF NOT EXISTS karaoke_delivery_models (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    source        TEXT NOT NULL,
    display_order INTEGER,
    UNIQUE(name, source)
);

CREATE TABLE IF NOT EXISTS song_delivery_models (
    song_id           INTEGER NOT NULL REFERENCES songs(id) ON DELETE CASCADE,
    delivery_model_id INTEGER NOT NULL REFERENCES karaoke_delivery_models(id),
    PRIMARY KEY (song_id, delivery_model_id)
);

CREATE TABLE IF NOT EXISTS music_posts (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    title             TEXT NOT NULL,
    artist_name       TEXT NOT NULL,
    producer          TEXT NOT NULL,
    delivery_deadline TEXT NOT NULL,
    source_url        TEXT NOT NULL,
    song_page_url     TEXT,
    UNIQUE(title, artist_name, producer, source_url)
);

CREATE TABLE IF NOT EXISTS song_deadlines (
    song_id    INTEGER PRIMARY KEY REFERENCES songs(id) ON DELETE CASCADE,
    deadline   TEXT NOT NULL,
    source_url TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ouchikaraoke_links (
    song_id INTEGER PRIMARY KEY REFERENCES songs(id) ON DELETE CASCADE,
    url     TEXT NOT NULL
);
"#;

/// SQLite implementation of the catalog store.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StoreError::from_sqlx)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }
}

fn parse_source(tag: &str) -> Result<KaraokeSource, StoreError> {
    KaraokeSource::parse(tag)
        .ok_or_else(|| StoreError::NotFound(format!("unknown source tag: {tag}")))
}

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn artist_from_row(row: &SqliteRow) -> Result<DisplayArtist, StoreError> {
    Ok(DisplayArtist {
        id: row.get("id"),
        name: row.get("name"),
        name_reading: none_if_empty(row.get("name_reading")),
        source: parse_source(&row.get::<String, _>("source"))?,
        url: none_if_empty(row.get("url")),
    })
}

fn song_from_row(row: &SqliteRow) -> Result<Song, StoreError> {
    Ok(Song {
        id: row.get("id"),
        title: row.get("title"),
        title_reading: none_if_empty(row.get("title_reading")),
        song_number: none_if_empty(row.get("song_number")),
        source: parse_source(&row.get::<String, _>("source"))?,
        url: row.get("url"),
        artist_id: row.get("artist_id"),
    })
}

fn music_post_from_row(row: &SqliteRow) -> MusicPost {
    MusicPost {
        id: row.get("id"),
        title: row.get("title"),
        artist_name: row.get("artist_name"),
        producer: row.get("producer"),
        delivery_deadline: row.get("delivery_deadline"),
        source_url: row.get("source_url"),
        song_page_url: row.get("song_page_url"),
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    async fn find_or_create_artist(
        &self,
        name: &str,
        source: KaraokeSource,
        url: Option<&str>,
    ) -> Result<DisplayArtist, StoreError> {
        let url = url.unwrap_or("");
        let select =
            "SELECT id, name, name_reading, source, url FROM display_artists \
             WHERE source = ? AND name = ? AND url = ?";
        if let Some(row) = sqlx::query(select)
            .bind(source.as_str())
            .bind(name)
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?
        {
            return artist_from_row(&row);
        }

        let insert = sqlx::query(
            "INSERT INTO display_artists (name, source, url) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(source.as_str())
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx);

        match insert {
            Ok(result) => Ok(DisplayArtist {
                id: result.last_insert_rowid(),
                name: name.to_string(),
                name_reading: None,
                source,
                url: none_if_empty(url.to_string()),
            }),
            // A concurrent writer created the same artist; return the winner.
            Err(StoreError::UniqueViolation(_)) => {
                let row = sqlx::query(select)
                    .bind(source.as_str())
                    .bind(name)
                    .bind(url)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
                artist_from_row(&row)
            }
            Err(e) => Err(e),
        }
    }

    async fn artists_by_source(
        &self,
        source: KaraokeSource,
    ) -> Result<Vec<DisplayArtist>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, name_reading, source, url FROM display_artists WHERE source = ?",
        )
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(artist_from_row).collect()
    }

    async fn artists_missing_reading(
        &self,
        source: KaraokeSource,
    ) -> Result<Vec<DisplayArtist>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, name_reading, source, url FROM display_artists \
             WHERE source = ? AND name_reading = ''",
        )
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(artist_from_row).collect()
    }

    async fn set_artist_reading(&self, artist_id: i64, reading: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE display_artists SET name_reading = ? WHERE id = ?")
            .bind(reading)
            .bind(artist_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn upsert_song(&self, song: &NewSong) -> Result<Song, StoreError> {
        let song_number = song.song_number.clone().unwrap_or_default();
        let title_reading = song.title_reading.clone().unwrap_or_default();
        sqlx::query(
            "INSERT INTO songs (title, title_reading, song_number, source, url, artist_id) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(source, url, artist_id, title, song_number) \
             DO UPDATE SET title_reading = excluded.title_reading",
        )
        .bind(&song.title)
        .bind(&title_reading)
        .bind(&song_number)
        .bind(song.source.as_str())
        .bind(&song.url)
        .bind(song.artist_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let row = sqlx::query(
            "SELECT id, title, title_reading, song_number, source, url, artist_id FROM songs \
             WHERE source = ? AND url = ? AND artist_id = ? AND title = ? AND song_number = ?",
        )
        .bind(song.source.as_str())
        .bind(&song.url)
        .bind(song.artist_id)
        .bind(&song.title)
        .bind(&song_number)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        song_from_row(&row)
    }

    async fn find_song_by_url(
        &self,
        source: KaraokeSource,
        url: &str,
    ) -> Result<Option<Song>, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, title_reading, song_number, source, url, artist_id FROM songs \
             WHERE source = ? AND url = ? LIMIT 1",
        )
        .bind(source.as_str())
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        row.as_ref().map(song_from_row).transpose()
    }

    async fn songs_by_source(&self, source: KaraokeSource) -> Result<Vec<Song>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, title_reading, song_number, source, url, artist_id FROM songs \
             WHERE source = ?",
        )
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter().map(song_from_row).collect()
    }

    async fn song_urls(&self, source: KaraokeSource) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT url FROM songs WHERE source = ?",
        )
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows)
    }

    async fn delete_song(&self, song_id: i64) -> Result<(), StoreError> {
        // Sidecars and associations cascade via foreign keys.
        sqlx::query("DELETE FROM songs WHERE id = ?")
            .bind(song_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn all_delivery_models(&self) -> Result<Vec<KaraokeDeliveryModel>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, source, display_order FROM karaoke_delivery_models",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter()
            .map(|row| {
                Ok(KaraokeDeliveryModel {
                    id: row.get("id"),
                    name: row.get("name"),
                    source: parse_source(&row.get::<String, _>("source"))?,
                    display_order: row.get("display_order"),
                })
            })
            .collect()
    }

    async fn find_delivery_model_id(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<Option<i64>, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM karaoke_delivery_models WHERE name = ? AND source = ?",
        )
        .bind(name)
        .bind(source.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn create_delivery_model(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO karaoke_delivery_models (name, source) VALUES (?, ?)",
        )
        .bind(name)
        .bind(source.as_str())
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(result.last_insert_rowid())
    }

    async fn song_delivery_model_ids(&self, song_id: i64) -> Result<Vec<i64>, StoreError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT delivery_model_id FROM song_delivery_models WHERE song_id = ?",
        )
        .bind(song_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn add_song_delivery_model(
        &self,
        song_id: i64,
        model_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO song_delivery_models (song_id, delivery_model_id) VALUES (?, ?)",
        )
        .bind(song_id)
        .bind(model_id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn remove_song_delivery_models(
        &self,
        song_id: i64,
        model_ids: &[i64],
    ) -> Result<(), StoreError> {
        for model_id in model_ids {
            sqlx::query(
                "DELETE FROM song_delivery_models WHERE song_id = ? AND delivery_model_id = ?",
            )
            .bind(song_id)
            .bind(model_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        }
        Ok(())
    }

    async fn upsert_music_post(&self, post: &NewMusicPost) -> Result<MusicPost, StoreError> {
        sqlx::query(
            "INSERT INTO music_posts (title, artist_name, producer, delivery_deadline, source_url) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(title, artist_name, producer, source_url) \
             DO UPDATE SET delivery_deadline = excluded.delivery_deadline",
        )
        .bind(&post.title)
        .bind(&post.artist_name)
        .bind(&post.producer)
        .bind(post.delivery_deadline)
        .bind(&post.source_url)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let row = sqlx::query(
            "SELECT id, title, artist_name, producer, delivery_deadline, source_url, song_page_url \
             FROM music_posts \
             WHERE title = ? AND artist_name = ? AND producer = ? AND source_url = ?",
        )
        .bind(&post.title)
        .bind(&post.artist_name)
        .bind(&post.producer)
        .bind(&post.source_url)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(music_post_from_row(&row))
    }

    async fn all_music_posts(&self) -> Result<Vec<MusicPost>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, artist_name, producer, delivery_deadline, source_url, song_page_url \
             FROM music_posts ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows.iter().map(music_post_from_row).collect())
    }

    async fn pending_music_posts(&self) -> Result<Vec<MusicPost>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, artist_name, producer, delivery_deadline, source_url, song_page_url \
             FROM music_posts WHERE song_page_url IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows.iter().map(music_post_from_row).collect())
    }

    async fn expired_music_posts(&self, before: NaiveDate) -> Result<Vec<MusicPost>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, title, artist_name, producer, delivery_deadline, source_url, song_page_url \
             FROM music_posts WHERE delivery_deadline < ? ORDER BY delivery_deadline",
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(rows.iter().map(music_post_from_row).collect())
    }

    async fn music_post_deadlines(&self) -> Result<HashMap<String, NaiveDate>, StoreError> {
        let rows = sqlx::query("SELECT source_url, delivery_deadline FROM music_posts")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(rows
            .iter()
            .map(|row| (row.get("source_url"), row.get("delivery_deadline")))
            .collect())
    }

    async fn find_music_post_by_artist_title(
        &self,
        artist_name: &str,
        title: &str,
    ) -> Result<Option<MusicPost>, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, artist_name, producer, delivery_deadline, source_url, song_page_url \
             FROM music_posts WHERE artist_name = ? AND title = ? LIMIT 1",
        )
        .bind(artist_name)
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(row.as_ref().map(music_post_from_row))
    }

    async fn set_music_post_song_page_url(
        &self,
        post_id: i64,
        url: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE music_posts SET song_page_url = ? WHERE id = ?")
            .bind(url)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn delete_music_post(&self, post_id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM music_posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn song_deadline(&self, song_id: i64) -> Result<Option<SongDeadline>, StoreError> {
        let row = sqlx::query(
            "SELECT song_id, deadline, source_url FROM song_deadlines WHERE song_id = ?",
        )
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(row.map(|row| SongDeadline {
            song_id: row.get("song_id"),
            deadline: row.get("deadline"),
            source_url: row.get("source_url"),
        }))
    }

    async fn upsert_song_deadline(
        &self,
        song_id: i64,
        deadline: NaiveDate,
        source_url: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO song_deadlines (song_id, deadline, source_url) VALUES (?, ?, ?) \
             ON CONFLICT(song_id) DO UPDATE SET \
             deadline = excluded.deadline, source_url = excluded.source_url",
        )
        .bind(song_id)
        .bind(deadline)
        .bind(source_url)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        Ok(())
    }

    async fn songs_with_deadlines(&self) -> Result<Vec<(Song, SongDeadline)>, StoreError> {
        let rows = sqlx::query(
            "SELECT s.id, s.title, s.title_reading, s.song_number, s.source, s.url, s.artist_id, \
                    d.deadline, d.source_url AS deadline_source_url \
             FROM songs s JOIN song_deadlines d ON d.song_id = s.id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;
        rows.iter()
            .map(|row| {
                let song = song_from_row(row)?;
                let deadline = SongDeadline {
                    song_id: song.id,
                    deadline: row.get("deadline"),
                    source_url: row.get("deadline_source_url"),
                };
                Ok((song, deadline))
            })
            .collect()
    }

    async fn ouchikaraoke_url(&self, song_id: i64) -> Result<Option<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT url FROM ouchikaraoke_links WHERE song_id = ?",
        )
        .bind(song_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)
    }

    async fn set_ouchikaraoke_url(
        &self,
        song_id: i64,
        url: Option<&str>,
    ) -> Result<(), StoreError> {
        match url {
            Some(url) => {
                sqlx::query(
                    "INSERT INTO ouchikaraoke_links (song_id, url) VALUES (?, ?) \
                     ON CONFLICT(song_id) DO UPDATE SET url = excluded.url",
                )
                .bind(song_id)
                .bind(url)
                .execute(&self.pool)
                .await
                .map_err(StoreError::from_sqlx)?;
            }
            None => {
                sqlx::query("DELETE FROM ouchikaraoke_links WHERE song_id = ?")
                    .bind(song_id)
                    .execute(&self.pool)
                    .await
                    .map_err(StoreError::from_sqlx)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, SqliteCatalogStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteCatalogStore::connect(&dir.path().join("catalog.db"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn artist_find_or_create_is_idempotent() {
        let (_dir, store) = temp_store().await;

        let first = store
            .find_or_create_artist("幽閉サテライト", KaraokeSource::Joysound, Some("https://a"))
            .await
            .unwrap();
        let second = store
            .find_or_create_artist("幽閉サテライト", KaraokeSource::Joysound, Some("https://a"))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        // Same name under another source is a different artist.
        let dam = store
            .find_or_create_artist("幽閉サテライト", KaraokeSource::Dam, Some("https://a"))
            .await
            .unwrap();
        assert_ne!(first.id, dam.id);
    }

    #[tokio::test]
    async fn concurrent_urlless_artist_creation_yields_one_row() {
        use std::sync::Arc;

        let (_dir, store) = temp_store().await;
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .find_or_create_artist("ZUN", KaraokeSource::JoysoundMusicPost, None)
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1, "duplicate artist rows created");
        assert_eq!(
            store
                .artists_by_source(KaraokeSource::JoysoundMusicPost)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn urlless_artist_round_trips_as_none() {
        let (_dir, store) = temp_store().await;
        let created = store
            .find_or_create_artist("あきやまうに", KaraokeSource::Joysound, None)
            .await
            .unwrap();
        assert_eq!(created.url, None);

        let reloaded = store
            .artists_by_source(KaraokeSource::Joysound)
            .await
            .unwrap();
        assert_eq!(reloaded[0].url, None);
        // A url-less and a url-carrying artist of the same name stay distinct.
        let with_url = store
            .find_or_create_artist("あきやまうに", KaraokeSource::Joysound, Some("https://a"))
            .await
            .unwrap();
        assert_ne!(created.id, with_url.id);
    }

    #[tokio::test]
    async fn song_upsert_is_idempotent() {
        let (_dir, store) = temp_store().await;
        let artist = store
            .find_or_create_artist("ZUN", KaraokeSource::Joysound, None)
            .await
            .unwrap();

        let song = NewSong {
            title: "色は匂へど散りぬるを".into(),
            title_reading: None,
            song_number: Some("123456".into()),
            source: KaraokeSource::Joysound,
            url: "https://www.joysound.com/web/search/song/1".into(),
            artist_id: artist.id,
        };
        let first = store.upsert_song(&song).await.unwrap();
        let second = store.upsert_song(&song).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.songs_by_source(KaraokeSource::Joysound).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_model_reports_unique_violation() {
        let (_dir, store) = temp_store().await;
        store
            .create_delivery_model("JOYSOUND MAX GO", KaraokeSource::Joysound)
            .await
            .unwrap();
        let err = store
            .create_delivery_model("JOYSOUND MAX GO", KaraokeSource::Joysound)
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn deleting_song_cascades_sidecars_and_associations() {
        let (_dir, store) = temp_store().await;
        let artist = store
            .find_or_create_artist("ZUN", KaraokeSource::JoysoundMusicPost, None)
            .await
            .unwrap();
        let song = store
            .upsert_song(&NewSong {
                title: "ネクロファンタジア".into(),
                title_reading: None,
                song_number: None,
                source: KaraokeSource::JoysoundMusicPost,
                url: "https://musicpost.joysound.com/music/1".into(),
                artist_id: artist.id,
            })
            .await
            .unwrap();

        let model = store
            .create_delivery_model("うたスキ", KaraokeSource::JoysoundMusicPost)
            .await
            .unwrap();
        store.add_song_delivery_model(song.id, model).await.unwrap();
        store
            .upsert_song_deadline(
                song.id,
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                "https://musicpost.joysound.com/post/1",
            )
            .await
            .unwrap();

        store.delete_song(song.id).await.unwrap();
        assert!(store.song_deadline(song.id).await.unwrap().is_none());
        assert!(store.song_delivery_model_ids(song.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn music_post_upsert_updates_deadline_in_place() {
        let (_dir, store) = temp_store().await;
        let mut post = NewMusicPost {
            title: "亡き王女の為のセプテット".into(),
            artist_name: "ZUN".into(),
            producer: "someone".into(),
            delivery_deadline: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            source_url: "https://musicpost.joysound.com/post/9".into(),
        };
        let first = store.upsert_music_post(&post).await.unwrap();

        post.delivery_deadline = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let second = store.upsert_music_post(&post).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(
            second.delivery_deadline,
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
        );
        assert_eq!(store.all_music_posts().await.unwrap().len(), 1);
    }
}
