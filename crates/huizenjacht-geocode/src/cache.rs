//! Best-effort in-memory cache of finished resolutions.
//!
//! A miss is always safe; there is no consistency across concurrent
//! requests or restarts.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::types::{NotFoundReason, Resolution};

struct CacheEntry {
    resolution: Resolution,
    inserted_at: Instant,
}

/// TTL cache keyed by [`crate::LocationQuery::cache_key`].
///
/// Holds at most `max_entries`; inserting into a full cache first drops
/// expired entries, then the oldest one. Timeouts are never stored.
pub struct ResolutionCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResolutionCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached resolution for `key` unless it has expired.
    pub async fn get(&self, key: &str) -> Option<Resolution> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                Some(entry.resolution.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, key: String, resolution: &Resolution) {
        if matches!(resolution, Resolution::NotFound(NotFoundReason::Timeout)) {
            return;
        }

        let mut entries = self.entries.lock().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        }
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            if let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            CacheEntry {
                resolution: resolution.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResolvedPlace, Source};

    fn found(name: &str) -> Resolution {
        Resolution::Found(ResolvedPlace {
            lat: 43.6,
            lng: 7.0,
            display_name: name.to_owned(),
            source: Source::NominatimStructured,
        })
    }

    #[tokio::test]
    async fn stores_found_and_not_found() {
        let cache = ResolutionCache::new(Duration::from_secs(60), 10);
        cache.insert("a".to_owned(), &found("Biot")).await;
        cache
            .insert("b".to_owned(), &Resolution::NotFound(NotFoundReason::NotFound))
            .await;

        assert_eq!(cache.get("a").await, Some(found("Biot")));
        assert_eq!(
            cache.get("b").await,
            Some(Resolution::NotFound(NotFoundReason::NotFound))
        );
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn never_stores_timeouts() {
        let cache = ResolutionCache::new(Duration::from_secs(60), 10);
        cache
            .insert("t".to_owned(), &Resolution::NotFound(NotFoundReason::Timeout))
            .await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = ResolutionCache::new(Duration::ZERO, 10);
        cache.insert("a".to_owned(), &found("Biot")).await;
        assert_eq!(cache.get("a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn full_cache_evicts_oldest_entry() {
        let cache = ResolutionCache::new(Duration::from_secs(60), 2);
        cache.insert("first".to_owned(), &found("1")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("second".to_owned(), &found("2")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("third".to_owned(), &found("3")).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("first").await, None);
        assert_eq!(cache.get("third").await, Some(found("3")));
    }
}
