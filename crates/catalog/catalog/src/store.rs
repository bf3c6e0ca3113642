use async_trait::async_trait;
use chrono::{DateTime, Utc};

use depot_core::{FileId, FileRecord};

use crate::error::CatalogError;

/// Trait for the relational system of record mapping file ids to metadata.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Every operation is batched: callers hand over the full id or record set
/// and the backend issues a single statement for it. All three operations
/// must treat an empty input as a no-op rather than issuing a malformed
/// query.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up records for a set of ids in one batch.
    ///
    /// Ids with no matching row are simply absent from the result; that is
    /// not an error at this layer. The result never contains two records
    /// for the same id.
    async fn find_by_ids(&self, ids: &[FileId]) -> Result<Vec<FileRecord>, CatalogError>;

    /// Update `last_read` for a set of ids in one batched statement.
    ///
    /// Callers pass the ids that actually produced rows in a preceding
    /// lookup; ids without a row are dropped silently.
    async fn touch_last_read(&self, ids: &[FileId], at: DateTime<Utc>) -> Result<(), CatalogError>;

    /// Insert a batch of records as a single all-or-nothing statement.
    ///
    /// Returns the number of rows written. If the backend reports fewer
    /// rows than `records.len()`, the batch is rolled back and
    /// [`CatalogError::InsertMismatch`] is returned; the caller must then
    /// undo any side effects it performed for the batch (such as bytes
    /// already written to disk).
    async fn insert_batch(&self, records: &[FileRecord]) -> Result<u64, CatalogError>;

    /// Lightweight connectivity probe for health reporting. Never raises.
    async fn ping(&self) -> bool;
}
