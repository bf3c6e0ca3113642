use std::time::Duration;

use async_trait::async_trait;

use depot_core::{FileId, FileRecord};

use crate::error::CacheError;

/// Trait for the ephemeral id-to-metadata cache sitting ahead of the catalog.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// A record only ever enters the cache after it has been read from the
/// catalog; absence is a routine miss, not an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the cached record for an id. `None` means a miss.
    async fn get(&self, id: &FileId) -> Result<Option<FileRecord>, CacheError>;

    /// Store a record under its id with the given time-to-live.
    async fn set(&self, record: &FileRecord, ttl: Duration) -> Result<(), CacheError>;

    /// Whether the cache is reachable. Must never raise: `false` is the
    /// routine degraded-mode signal consumed by the resolver.
    async fn health_check(&self) -> bool;
}
