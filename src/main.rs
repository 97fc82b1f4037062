use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use karaoke_ingest::application::{
    process_in_parallel, DamScraper, DeliveryModelCache, ErrorReporter, JoysoundScraper,
    MusicPostManager, ResumableProcessor, SiteScraper,
};
use karaoke_ingest::infrastructure::browser_session::BrowserSessionConfig;
use karaoke_ingest::infrastructure::config::AppConfig;
use karaoke_ingest::infrastructure::logging::init_logging;
use karaoke_ingest::domain::entities::KaraokeSource;
use karaoke_ingest::infrastructure::store::{CatalogStore, SqliteCatalogStore};
use karaoke_ingest::infrastructure::url_checker::UrlChecker;

const USAGE: &str = "usage: karaoke-ingest <command> [args]

commands:
  full-maintenance          run all four freshness stages
  cleanup-expired           stage 1: drop expired posts with dead pages
  fetch-pending             stage 2: re-scrape post song pages by priority
  refresh-existing          stage 3: drop catalog songs whose pages are gone
  sync-deadlines            stage 4: sync post deadlines into song sidecars
  fetch-posts               walk the music-post search listings
  resolve-posts             match pending posts to song page urls
  refresh-posts             resumable re-scrape of all matched posts
  backfill-readings         fill in missing artist name readings
  fetch-url <url>           scrape one JOYSOUND song page
  fetch-dam-url <url>       scrape one DAM song leaf page
  discover-joysound         walk the JOYSOUND genre listing and scrape new songs
  discover-dam              walk DAM artist listings and scrape new songs
  update-dam-models         re-derive delivery models for every DAM song

environment:
  KARAOKE_INGEST_CONFIG     config file path (default ./config.json)
  KARAOKE_INGEST_SELECTORS  selector file path (default: built-in)
  RUST_LOG                  log filter override";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        bail!("no command given");
    };

    let config_path = std::env::var("KARAOKE_INGEST_CONFIG")
        .unwrap_or_else(|_| "./config.json".to_string());
    let config = AppConfig::load_or_create(Path::new(&config_path)).await?;
    let _log_guard = init_logging(&config.report_dir.join("logs"))?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = Arc::new(SqliteCatalogStore::connect(&config.database_path).await?);
    let cache = Arc::new(DeliveryModelCache::new(store.clone(), &config.cache));
    let selector_path = std::env::var_os("KARAOKE_INGEST_SELECTORS").map(PathBuf::from);
    let selectors = config.load_selectors(selector_path.as_deref()).await?;
    let session_config = BrowserSessionConfig::from(&config.browser);

    let joysound = Arc::new(JoysoundScraper::new(
        store.clone(),
        cache.clone(),
        selectors.joysound.clone(),
        selectors.music_post_list.clone(),
        session_config.clone(),
        config.retry.max_attempts,
        config.filters.joysound.clone(),
    ));
    let dam = Arc::new(DamScraper::new(
        store.clone(),
        cache.clone(),
        selectors.dam.clone(),
        session_config.clone(),
        config.retry.max_attempts,
        config.filters.dam.clone(),
    ));
    let liveness = Arc::new(UrlChecker::new(&config.liveness));
    let reporter = Arc::new(ErrorReporter::new());
    let manager = MusicPostManager::new(
        store.clone(),
        liveness,
        joysound.clone(),
        reporter.clone(),
        config.batch.clone(),
        &config.maintenance,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing current item");
                cancel.cancel();
            }
        });
    }

    let today = Utc::now().date_naive();
    match command {
        "full-maintenance" => {
            let report = manager.perform_full_maintenance(today).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "cleanup-expired" => {
            let stats = manager.cleanup_expired(today).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "fetch-pending" => {
            let stats = manager.fetch_prioritized(today).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "refresh-existing" => {
            let stats = manager.refresh_existing().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "sync-deadlines" => {
            let stats = manager.sync_deadlines().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        "fetch-posts" => {
            let seen = joysound.fetch_music_posts().await?;
            println!("saw {seen} music posts");
        }
        "resolve-posts" => {
            let resolved = joysound.resolve_song_page_urls().await?;
            println!("resolved {resolved} song page urls");
        }
        "refresh-posts" => {
            let posts: Vec<_> = store
                .all_music_posts()
                .await?
                .into_iter()
                .filter(|p| p.song_page_url.is_some())
                .collect();
            let processor =
                ResumableProcessor::new(&config.state_dir, config.maintenance.checkpoint_every);
            let scraper = joysound.clone();
            let rec = reporter.clone();
            let state = processor
                .process(
                    "music-post-refresh",
                    posts,
                    |p| p.source_url.clone(),
                    &cancel,
                    move |post| {
                        let scraper = scraper.clone();
                        let rec = rec.clone();
                        async move {
                            scraper.scrape_music_post_page(&post).await.map_err(|e| {
                                let url =
                                    post.song_page_url.as_deref().unwrap_or(&post.source_url);
                                rec.record(url, &e);
                                e
                            })?;
                            Ok(())
                        }
                    },
                )
                .await?;
            println!(
                "run '{}' {:?}: {} done, {} errors",
                state.run_id,
                state.status,
                state.processed_ids.len(),
                state.errors.len()
            );
        }
        "backfill-readings" => {
            let updated = joysound.backfill_artist_readings().await?;
            println!("backfilled {updated} artist readings");
        }
        "fetch-url" => {
            let Some(url) = args.get(1) else {
                bail!("fetch-url needs a url argument");
            };
            let songs = joysound.scrape_song_page(url).await?;
            println!("upserted {} songs", songs.len());
        }
        "fetch-dam-url" => {
            let Some(url) = args.get(1) else {
                bail!("fetch-dam-url needs a url argument");
            };
            let songs = dam.scrape_song_page(url).await?;
            println!("upserted {} songs", songs.len());
        }
        "discover-joysound" => {
            let urls = joysound.discover_song_urls().await?;
            let scraper = joysound.clone();
            let rec = reporter.clone();
            let outcome = process_in_parallel(urls, &config.batch, move |url| {
                let scraper = scraper.clone();
                let rec = rec.clone();
                async move {
                    scraper.scrape_song_page(&url).await.map_err(|e| {
                        rec.record(&url, &e);
                        e
                    })?;
                    Ok(())
                }
            })
            .await;
            println!(
                "scraped {} of {} pages",
                outcome.succeeded(),
                outcome.processed
            );
        }
        "update-dam-models" => {
            let songs = store.songs_by_source(KaraokeSource::Dam).await?;
            let scraper = dam.clone();
            let rec = reporter.clone();
            let outcome = process_in_parallel(songs, &config.batch, move |song| {
                let scraper = scraper.clone();
                let rec = rec.clone();
                async move {
                    scraper.update_delivery_models(&song).await.map_err(|e| {
                        rec.record(&song.url, &e);
                        e
                    })?;
                    Ok(())
                }
            })
            .await;
            println!(
                "refreshed {} of {} songs",
                outcome.succeeded(),
                outcome.processed
            );
        }
        "discover-dam" => {
            let urls = dam.discover_song_urls().await?;
            let scraper = dam.clone();
            let rec = reporter.clone();
            let outcome = process_in_parallel(urls, &config.batch, move |url| {
                let scraper = scraper.clone();
                let rec = rec.clone();
                async move {
                    scraper.scrape_song_page(&url).await.map_err(|e| {
                        rec.record(&url, &e);
                        e
                    })?;
                    Ok(())
                }
            })
            .await;
            println!(
                "scraped {} of {} pages",
                outcome.succeeded(),
                outcome.processed
            );
        }
        other => {
            eprintln!("{USAGE}");
            bail!("unknown command: {other}");
        }
    }

    reporter.log_summary();
    if let Some(path) = reporter.maybe_export(
        &config.report_dir,
        config.maintenance.error_export_threshold,
    )? {
        println!("error report: {}", path.display());
    }
    Ok(())
}
