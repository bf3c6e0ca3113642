//! In-memory [`CatalogStore`] backed by a [`DashMap`].
//!
//! Used by unit and router tests. Besides the store contract it records how
//! many batch lookups were issued, so tests can assert that resolution costs
//! a single catalog round trip, and it can be armed to fail the next insert
//! to exercise ingestion rollback.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use depot_catalog::error::CatalogError;
use depot_catalog::store::CatalogStore;
use depot_core::{FileId, FileRecord};

/// In-memory catalog for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    records: DashMap<String, FileRecord>,
    find_calls: AtomicUsize,
    fail_next_insert: AtomicBool,
}

impl MemoryCatalog {
    /// Create a new, empty in-memory catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_ids` batch calls issued so far.
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    /// Arm the catalog to reject the next `insert_batch` with a row-count
    /// mismatch, leaving no rows behind.
    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    /// Number of records currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_by_ids(&self, ids: &[FileId]) -> Result<Vec<FileRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        Ok(ids
            .iter()
            .filter_map(|id| self.records.get(id.as_str()).map(|r| r.clone()))
            .collect())
    }

    async fn touch_last_read(&self, ids: &[FileId], at: DateTime<Utc>) -> Result<(), CatalogError> {
        for id in ids {
            if let Some(mut record) = self.records.get_mut(id.as_str()) {
                record.last_read = Some(at);
            }
        }
        Ok(())
    }

    async fn insert_batch(&self, records: &[FileRecord]) -> Result<u64, CatalogError> {
        if records.is_empty() {
            return Ok(0);
        }
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(CatalogError::InsertMismatch {
                expected: records.len() as u64,
                inserted: 0,
            });
        }

        for record in records {
            self.records
                .insert(record.id.as_str().to_owned(), record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn ping(&self) -> bool {
        true
    }
}
