//! Cached metadata lookup.
//!
//! Every distinct normalized key gets its own async slot. A caller holds the
//! slot's lock for the whole cache-check-then-fetch sequence, so concurrent
//! callers for one key wait for the first lookup and reuse its result.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reelcast_api::MetadataSearch;
use reelcast_parse::normalize_key;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::models::{ResolvedMetadata, WatchFact};

#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    /// How long a failed or empty lookup is served from cache.
    pub negative_ttl: Duration,
    /// Upper bound on one external lookup.
    pub timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            negative_ttl: Duration::from_secs(600),
            timeout: Duration::from_secs(5),
        }
    }
}

impl From<&MetadataConfig> for ResolverSettings {
    fn from(config: &MetadataConfig) -> Self {
        Self {
            negative_ttl: config.negative_ttl(),
            timeout: config.timeout(),
        }
    }
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Found(ResolvedMetadata),
    /// Lookup failed or matched nothing.
    Negative { at: Instant },
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

/// Counters for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub negative_hits: u64,
    pub misses: u64,
    /// External lookups issued.
    pub lookups: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    negative_hits: AtomicU64,
    misses: AtomicU64,
    lookups: AtomicU64,
}

/// Resolves watch facts to artwork through a [`MetadataSearch`], caching by
/// normalized title and season.
pub struct MetadataResolver<S> {
    search: S,
    settings: ResolverSettings,
    slots: Mutex<HashMap<String, Slot>>,
    counters: Counters,
}

impl<S: MetadataSearch> MetadataResolver<S> {
    pub fn new(search: S, settings: ResolverSettings) -> Self {
        Self {
            search,
            settings,
            slots: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Metadata for a fact. Never fails: errors, timeouts and empty results
    /// all come back as [`ResolvedMetadata::none`] and are cached negatively.
    pub async fn resolve(&self, fact: &WatchFact) -> ResolvedMetadata {
        if fact.is_placeholder() {
            debug!(fact = %fact, "Not looking up a landing page");
            return ResolvedMetadata::none();
        }

        let season = fact.season();
        let key = normalize_key(&fact.display_title, season);
        let slot = self.slot(&key);
        let mut entry = slot.lock().await;

        match &*entry {
            Some(CacheEntry::Found(meta)) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Metadata cache hit");
                return meta.clone();
            }
            Some(CacheEntry::Negative { at }) if at.elapsed() < self.settings.negative_ttl => {
                self.counters.negative_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Metadata negative cache hit");
                return ResolvedMetadata::none();
            }
            _ => {}
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        self.counters.lookups.fetch_add(1, Ordering::Relaxed);

        let lookup = self.search.search(&fact.display_title, season);
        let found = match tokio::time::timeout(self.settings.timeout, lookup).await {
            Ok(Ok(candidates)) => {
                let best = candidates.into_iter().next();
                if best.is_none() {
                    debug!(key = %key, "Metadata lookup found nothing");
                }
                best.map(ResolvedMetadata::from)
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Metadata lookup failed");
                None
            }
            Err(_) => {
                warn!(key = %key, timeout = ?self.settings.timeout, "Metadata lookup timed out");
                None
            }
        };

        match found {
            Some(meta) => {
                debug!(key = %key, title = ?meta.canonical_title, "Metadata resolved");
                *entry = Some(CacheEntry::Found(meta.clone()));
                meta
            }
            None => {
                *entry = Some(CacheEntry::Negative { at: Instant::now() });
                ResolvedMetadata::none()
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            negative_hits: self.counters.negative_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            lookups: self.counters.lookups.load(Ordering::Relaxed),
            entries: self.lock_slots().len(),
        }
    }

    fn slot(&self, key: &str) -> Slot {
        self.lock_slots()
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
