//! Cache-aside resolution of file ids to catalog records.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use depot_cache::CacheStore;
use depot_catalog::{CatalogError, CatalogStore};
use depot_core::{FileId, FileRecord};

/// Resolves sets of file ids to their records with minimum catalog load.
///
/// Reads go through the cache first; all misses are folded into a single
/// catalog batch lookup, and every record that lookup returns is written
/// back to the cache. The cache is strictly an accelerator: any cache
/// failure degrades to catalog-only resolution, while a catalog failure
/// fails the request.
pub struct Resolver {
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl Resolver {
    /// Create a resolver over the given backends with the given cache TTL.
    pub fn new(catalog: Arc<dyn CatalogStore>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { catalog, cache, ttl }
    }

    /// Resolve a set of distinct ids to records.
    ///
    /// Ids with no record anywhere are absent from the result; callers
    /// decide whether a short result is an error. The result never holds
    /// two records for the same id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] only for catalog failures. Cache failures
    /// are logged and treated as misses.
    pub async fn resolve(&self, ids: &[FileId]) -> Result<Vec<FileRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        if !self.cache.health_check().await {
            debug!("cache unavailable, resolving against the catalog only");
            return self.lookup(ids).await;
        }

        let mut records = Vec::with_capacity(ids.len());
        let mut missed = Vec::new();
        for id in ids {
            match self.cache.get(id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => missed.push(id.clone()),
                Err(e) => {
                    debug!(id = %id, error = %e, "cache read failed, treating as a miss");
                    missed.push(id.clone());
                }
            }
        }

        if !missed.is_empty() {
            for record in self.lookup(&missed).await? {
                if let Err(e) = self.cache.set(&record, self.ttl).await {
                    debug!(id = %record.id, error = %e, "cache write failed, skipping");
                }
                records.push(record);
            }
        }

        Ok(records)
    }

    /// One catalog batch lookup, touching `last_read` for every id that
    /// produced a row. Cache hits never reach this path, so heavily cached
    /// files keep a stale `last_read` on purpose.
    async fn lookup(&self, ids: &[FileId]) -> Result<Vec<FileRecord>, CatalogError> {
        let records = self.catalog.find_by_ids(ids).await?;
        if !records.is_empty() {
            let found: Vec<FileId> = records.iter().map(|r| r.id.clone()).collect();
            self.catalog.touch_last_read(&found, Utc::now()).await?;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use depot_cache::error::CacheError;
    use depot_cache_memory::MemoryCache;
    use depot_catalog_memory::MemoryCatalog;

    fn record(name: &str) -> FileRecord {
        FileRecord::new(name, depot_core::storage_name(name), 4, "text/plain")
    }

    async fn seeded_catalog(names: &[&str]) -> (Arc<MemoryCatalog>, Vec<FileRecord>) {
        let catalog = Arc::new(MemoryCatalog::new());
        let records: Vec<FileRecord> = names.iter().map(|n| record(n)).collect();
        catalog.insert_batch(&records).await.unwrap();
        (catalog, records)
    }

    fn resolver(catalog: Arc<MemoryCatalog>, cache: Arc<MemoryCache>) -> Resolver {
        Resolver::new(catalog, cache, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn misses_resolve_in_a_single_batch_call() {
        let (catalog, records) = seeded_catalog(&["a.txt", "b.txt", "c.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        let resolver = resolver(catalog.clone(), cache);
        let baseline = catalog.find_calls();

        let ids: Vec<FileId> = records.iter().map(|r| r.id.clone()).collect();
        let resolved = resolver.resolve(&ids).await.unwrap();

        assert_eq!(resolved.len(), 3);
        // One batch for all three misses, never one call per id.
        assert_eq!(catalog.find_calls() - baseline, 1);
    }

    #[tokio::test]
    async fn second_resolution_is_served_from_the_cache() {
        let (catalog, records) = seeded_catalog(&["a.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        let resolver = resolver(catalog.clone(), cache.clone());

        let ids = vec![records[0].id.clone()];
        resolver.resolve(&ids).await.unwrap();
        let after_first = catalog.find_calls();

        let resolved = resolver.resolve(&ids).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].file, records[0].file);
        // Populated on the first miss, so no further catalog call.
        assert_eq!(catalog.find_calls(), after_first);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_cache_degrades_to_catalog_only() {
        let (catalog, records) = seeded_catalog(&["a.txt", "b.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        cache.set_available(false);
        let resolver = resolver(catalog, cache.clone());

        let ids: Vec<FileId> = records.iter().map(|r| r.id.clone()).collect();
        let resolved = resolver.resolve(&ids).await.unwrap();

        assert_eq!(resolved.len(), 2);
        // Degraded mode never writes to the cache either.
        cache.set_available(true);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn partial_hits_only_look_up_the_miss_set() {
        let (catalog, records) = seeded_catalog(&["a.txt", "b.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        cache
            .set(&records[0], Duration::from_secs(60))
            .await
            .unwrap();
        let resolver = resolver(catalog.clone(), cache);
        let baseline = catalog.find_calls();

        let ids: Vec<FileId> = records.iter().map(|r| r.id.clone()).collect();
        let resolved = resolver.resolve(&ids).await.unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(catalog.find_calls() - baseline, 1);
        let mut names: Vec<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn unknown_ids_are_absent_not_errors() {
        let (catalog, records) = seeded_catalog(&["a.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        let resolver = resolver(catalog, cache);

        let ghost = FileId::from_storage_name("never-stored");
        let resolved = resolver
            .resolve(&[records[0].id.clone(), ghost])
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn catalog_resolution_touches_last_read_for_found_ids_only() {
        let (catalog, records) = seeded_catalog(&["a.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        let resolver = resolver(catalog.clone(), cache.clone());

        let ghost = FileId::from_storage_name("never-stored");
        resolver
            .resolve(&[records[0].id.clone(), ghost])
            .await
            .unwrap();

        let stored = catalog
            .find_by_ids(std::slice::from_ref(&records[0].id))
            .await
            .unwrap();
        assert!(stored[0].last_read.is_some());
    }

    #[tokio::test]
    async fn cache_hits_do_not_touch_last_read() {
        let (catalog, records) = seeded_catalog(&["a.txt"]).await;
        let cache = Arc::new(MemoryCache::new());
        // Pre-populated cache entry with no catalog involvement.
        cache
            .set(&records[0], Duration::from_secs(60))
            .await
            .unwrap();
        let resolver = resolver(catalog.clone(), cache);

        resolver.resolve(&[records[0].id.clone()]).await.unwrap();

        let stored = catalog
            .find_by_ids(std::slice::from_ref(&records[0].id))
            .await
            .unwrap();
        assert!(stored[0].last_read.is_none());
    }

    /// Cache whose reads always error while its health check stays green.
    struct FlakyCache;

    #[async_trait::async_trait]
    impl CacheStore for FlakyCache {
        async fn get(&self, _id: &FileId) -> Result<Option<FileRecord>, CacheError> {
            Err(CacheError::Backend("read reset by peer".into()))
        }

        async fn set(&self, _record: &FileRecord, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("write reset by peer".into()))
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn cache_errors_fail_open() {
        let (catalog, records) = seeded_catalog(&["a.txt"]).await;
        let resolver = Resolver::new(catalog, Arc::new(FlakyCache), Duration::from_secs(60));

        let resolved = resolver.resolve(&[records[0].id.clone()]).await.unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
