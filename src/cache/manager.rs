//! Document cache manager
//!
//! Provides a `DocumentCache` that serves rendered HTML while it is within its
//! TTL and otherwise fetches, renders and stores the document again.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{CacheEntry, Clock, DiskStore, SystemClock};
use crate::data::source::DEFAULT_FETCH_TIMEOUT;
use crate::data::{DocId, DocumentSource, FetchError};
use crate::render::render;

/// Configuration for cache expiry and fetch bounds
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a rendered document may be served from cache
    pub ttl: Duration,
    /// Upper bound on a single source fetch
    pub fetch_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600), // 10 minutes
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Caches rendered documents keyed by identifier
///
/// Entries are never evicted; an expired entry is overwritten by the next
/// successful fetch. A failed fetch leaves the cache untouched. The map lock is
/// never held across the source fetch, so concurrent misses for one identifier
/// both fetch and the last write wins.
pub struct DocumentCache<S, C = SystemClock> {
    source: S,
    clock: C,
    config: CacheConfig,
    entries: RwLock<HashMap<DocId, CacheEntry>>,
    store: Option<DiskStore>,
}

impl<S: DocumentSource> DocumentCache<S, SystemClock> {
    /// Creates a cache over `source` using wall-clock time
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self::with_clock(source, SystemClock, config)
    }
}

impl<S: DocumentSource, C: Clock> DocumentCache<S, C> {
    /// Creates a cache with a custom clock
    pub fn with_clock(source: S, clock: C, config: CacheConfig) -> Self {
        Self {
            source,
            clock,
            config,
            entries: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Mirrors entries to `store` and consults it on memory misses
    pub fn with_store(mut self, store: DiskStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.ttl).unwrap_or(chrono::Duration::MAX)
    }

    /// Returns cached HTML for `id` if present and within the TTL
    ///
    /// Invalid identifiers are a miss.
    pub async fn get(&self, id: &str) -> Option<String> {
        let id = DocId::parse(id).ok()?;
        self.lookup(&id).await
    }

    async fn lookup(&self, id: &DocId) -> Option<String> {
        let now = self.clock.now();
        let ttl = self.ttl();

        if let Some(entry) = self.entries.read().await.get(id) {
            if entry.is_fresh(now, ttl) {
                return Some(entry.html.clone());
            }
        }

        let entry = self.store.as_ref()?.read(id)?;
        if !entry.is_fresh(now, ttl) {
            return None;
        }
        debug!("Loaded '{}' from disk cache", id);
        let html = entry.html.clone();
        self.entries.write().await.insert(id.clone(), entry);
        Some(html)
    }

    /// Returns rendered HTML for `id`, fetching from the source on a miss
    ///
    /// # Returns
    /// * `Ok(String)` - cached HTML, or freshly fetched and rendered HTML
    /// * `Err(FetchError)` - invalid identifier, network failure, non-success
    ///   status or timeout; the cache is left unchanged
    pub async fn fetch_and_render(&self, id: &str) -> Result<String, FetchError> {
        let id = DocId::parse(id)?;

        if let Some(html) = self.lookup(&id).await {
            debug!("Cache hit for '{}'", id);
            return Ok(html);
        }
        debug!("Cache miss for '{}'", id);

        let after = self.config.fetch_timeout;
        let text = tokio::time::timeout(after, self.source.fetch_text(&id))
            .await
            .map_err(|_| FetchError::Timeout {
                id: id.to_string(),
                after,
            })??;

        let entry = CacheEntry {
            html: render(&text),
            fetched_at: self.clock.now(),
        };
        let html = entry.html.clone();

        if let Some(store) = &self.store {
            if let Err(e) = store.write(&id, &entry) {
                warn!("Could not persist '{}' to disk cache: {}", id, e);
            }
        }
        self.entries.write().await.insert(id.clone(), entry);
        info!("Rendered '{}' ({} bytes of HTML)", id, html.len());

        Ok(html)
    }

    /// External location of `id`, for linking to it when it cannot be shown
    pub fn location(&self, id: &DocId) -> String {
        self.source.location(id)
    }
}
