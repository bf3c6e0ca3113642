//! In-memory [`CacheStore`] backed by a [`DashMap`].
//!
//! Entries are lazily evicted on read when their TTL has elapsed. The store
//! can be switched to an "unavailable" state so tests can exercise the
//! resolver's degraded mode and fail-open behavior.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use depot_cache::error::CacheError;
use depot_cache::store::CacheStore;
use depot_core::{FileId, FileRecord};

/// A single cached record with its expiry deadline.
#[derive(Debug, Clone)]
struct Entry {
    record: FileRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache for tests and local development.
#[derive(Debug)]
pub struct MemoryCache {
    data: DashMap<String, Entry>,
    available: AtomicBool,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self {
            data: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryCache {
    /// Create a new, empty, available cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability. While unavailable, `health_check` reports
    /// `false` and `get`/`set` return connection errors.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live entries currently cached.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Connection("cache unavailable".into()))
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, id: &FileId) -> Result<Option<FileRecord>, CacheError> {
        self.check_available()?;

        // Lazy TTL eviction: drop the entry if its deadline has passed.
        if let Some(entry) = self.data.get(id.as_str()) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove(id.as_str());
                return Ok(None);
            }
            return Ok(Some(entry.record.clone()));
        }

        Ok(None)
    }

    async fn set(&self, record: &FileRecord, ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;

        self.data.insert(
            record.id.as_str().to_owned(),
            Entry {
                record: record.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> FileRecord {
        FileRecord::new(name, depot_core::storage_name(name), 4, "text/plain")
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        let r = record("a.txt");
        cache.set(&r, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(&r.id).await.unwrap(), Some(r));
    }

    #[tokio::test]
    async fn miss_is_none() {
        let cache = MemoryCache::new();
        let ghost = FileId::from_storage_name("never-cached");
        assert_eq!(cache.get(&ghost).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        let r = record("a.txt");
        cache.set(&r, Duration::from_secs(60)).await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(cache.get(&r.id).await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unavailable_cache_fails_operations_but_not_health() {
        let cache = MemoryCache::new();
        cache.set_available(false);

        assert!(!cache.health_check().await);
        let r = record("a.txt");
        assert!(cache.set(&r, Duration::from_secs(60)).await.is_err());
        assert!(cache.get(&r.id).await.is_err());

        cache.set_available(true);
        assert!(cache.health_check().await);
    }
}
