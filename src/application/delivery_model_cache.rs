//! Entity resolution cache for delivery models.
//!
//! The set of delivery models is tiny and almost static while the scrapers
//! resolve names for every song row, so resolutions go through a TTL'd
//! in-memory map. Creation uses double-checked locking against the store's
//! unique index so concurrent workers converge on one row per
//! `(name, source)` pair.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::entities::KaraokeSource;
use crate::domain::error::StoreError;
use crate::infrastructure::config::CacheConfig;
use crate::infrastructure::store::CatalogStore;

/// Fold full-width spaces into ASCII, collapse runs, trim. Applied before
/// every lookup and insert so vendor spacing quirks cannot split a model
/// into duplicate rows.
pub fn normalize_model_name(raw: &str) -> String {
    let folded: String = raw
        .chars()
        .map(|c| if c == '\u{3000}' { ' ' } else { c })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct CacheState {
    by_key: HashMap<(String, KaraokeSource), i64>,
    expires_at: Instant,
}

/// TTL'd name → id cache over the delivery-model table.
pub struct DeliveryModelCache {
    store: Arc<dyn CatalogStore>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl DeliveryModelCache {
    pub fn new(store: Arc<dyn CatalogStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(config.ttl_minutes * 60),
            state: Mutex::new(CacheState {
                by_key: HashMap::new(),
                expires_at: Instant::now(),
            }),
        }
    }

    /// Look a model up without creating it.
    pub async fn get_id(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<Option<i64>, StoreError> {
        let name = normalize_model_name(name);
        let mut state = self.state.lock().await;
        if state.expires_at <= Instant::now() {
            self.reload(&mut state).await?;
        }
        Ok(state.by_key.get(&(name, source)).copied())
    }

    /// Reload the map from the store immediately.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        self.reload(&mut state).await
    }

    /// Resolve a model name to its id, creating the row when it is new.
    pub async fn find_or_create_id(
        &self,
        name: &str,
        source: KaraokeSource,
    ) -> Result<i64, StoreError> {
        let name = normalize_model_name(name);
        let key = (name.clone(), source);

        let mut state = self.state.lock().await;
        if state.expires_at <= Instant::now() {
            self.reload(&mut state).await?;
        }
        if let Some(id) = state.by_key.get(&key) {
            return Ok(*id);
        }

        // Check the store before inserting; another process may have won.
        if let Some(id) = self.store.find_delivery_model_id(&name, source).await? {
            state.by_key.insert(key, id);
            return Ok(id);
        }

        match self.store.create_delivery_model(&name, source).await {
            Ok(id) => {
                debug!("created delivery model {name} ({source})");
                state.by_key.insert(key, id);
                Ok(id)
            }
            Err(e) if e.is_unique_violation() => {
                // Lost the race; the winner's row is authoritative.
                let id = self
                    .store
                    .find_delivery_model_id(&name, source)
                    .await?
                    .ok_or_else(|| {
                        StoreError::NotFound(format!("delivery model vanished: {name}"))
                    })?;
                state.by_key.insert(key, id);
                Ok(id)
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve a batch of names, preserving order.
    pub async fn find_or_create_ids(
        &self,
        names: &[String],
        source: KaraokeSource,
    ) -> Result<Vec<i64>, StoreError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.find_or_create_id(name, source).await?);
        }
        Ok(ids)
    }

    /// Drop the cached map; the next lookup reloads from the store.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.by_key.clear();
        state.expires_at = Instant::now();
    }

    async fn reload(&self, state: &mut CacheState) -> Result<(), StoreError> {
        let models = self.store.all_delivery_models().await?;
        state.by_key = models
            .into_iter()
            .map(|m| ((normalize_model_name(&m.name), m.source), m.id))
            .collect();
        state.expires_at = Instant::now() + self.ttl;
        debug!("delivery model cache reloaded: {} entries", state.by_key.len());
        Ok(())
    }
}
