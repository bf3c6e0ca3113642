use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder, Row};

use depot_catalog::error::CatalogError;
use depot_catalog::store::CatalogStore;
use depot_core::{FileId, FileRecord};

use crate::config::PostgresConfig;
use crate::migrations;

/// PostgreSQL-backed implementation of [`CatalogStore`].
///
/// Uses `sqlx::PgPool` for connection pooling. All lookups and touches are
/// batched with `= ANY($1)` so a request for N ids costs one round trip,
/// and every statement is parameterized.
pub struct PostgresCatalog {
    pool: PgPool,
    config: Arc<PostgresConfig>,
}

impl PostgresCatalog {
    /// Create a new `PostgresCatalog` from the provided configuration.
    ///
    /// Connects to `PostgreSQL`, creates the connection pool, and runs
    /// migrations to ensure the upload table exists.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Connection`] if pool creation fails, or
    /// [`CatalogError::Backend`] if migrations fail.
    pub async fn new(config: PostgresConfig) -> Result<Self, CatalogError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Create a `PostgresCatalog` from an existing pool and config.
    ///
    /// Runs migrations on creation.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Backend`] if migrations fail.
    pub async fn from_pool(pool: PgPool, config: PostgresConfig) -> Result<Self, CatalogError> {
        migrations::run_migrations(&pool, &config)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    fn bind_ids(ids: &[FileId]) -> Vec<String> {
        ids.iter().map(|id| id.as_str().to_owned()).collect()
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalog {
    async fn find_by_ids(&self, ids: &[FileId]) -> Result<Vec<FileRecord>, CatalogError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let table = self.config.upload_table();
        let query = format!(
            "SELECT id, name, file, size, type, last_read FROM {table} WHERE id = ANY($1)"
        );

        let rows = sqlx::query(&query)
            .bind(Self::bind_ids(ids))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_id: String = row.get("id");
            let id = FileId::parse(raw_id.trim()).ok_or_else(|| {
                CatalogError::Backend(format!("catalog returned malformed id: {raw_id}"))
            })?;
            records.push(FileRecord {
                id,
                name: row.get("name"),
                file: row.get("file"),
                size: row.get("size"),
                media_type: row.get("type"),
                last_read: row.get::<Option<DateTime<Utc>>, _>("last_read"),
            });
        }

        Ok(records)
    }

    async fn touch_last_read(&self, ids: &[FileId], at: DateTime<Utc>) -> Result<(), CatalogError> {
        if ids.is_empty() {
            return Ok(());
        }

        let table = self.config.upload_table();
        let query = format!("UPDATE {table} SET last_read = $1 WHERE id = ANY($2)");

        sqlx::query(&query)
            .bind(at)
            .bind(Self::bind_ids(ids))
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn insert_batch(&self, records: &[FileRecord]) -> Result<u64, CatalogError> {
        if records.is_empty() {
            return Ok(0);
        }

        let table = self.config.upload_table();
        let expected = records.len() as u64;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("INSERT INTO {table} (id, name, file, size, type) "));
        builder.push_values(records, |mut b, record| {
            b.push_bind(record.id.as_str())
                .push_bind(&record.name)
                .push_bind(&record.file)
                .push_bind(record.size)
                .push_bind(&record.media_type);
        });

        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        let inserted = result.rows_affected();
        if inserted != expected {
            tx.rollback()
                .await
                .map_err(|e| CatalogError::Backend(e.to_string()))?;
            return Err(CatalogError::InsertMismatch { expected, inserted });
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::Backend(e.to_string()))?;

        Ok(inserted)
    }

    async fn ping(&self) -> bool {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(self.config.acquire_timeout, probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "catalog ping failed");
                false
            }
            Err(_) => {
                tracing::debug!("catalog ping timed out");
                false
            }
        }
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/depot_test".to_string()),
            table_prefix: format!("test_{}_", uuid::Uuid::new_v4().simple()),
            ..PostgresConfig::default()
        }
    }

    #[tokio::test]
    async fn insert_find_touch_round_trip() {
        let catalog = PostgresCatalog::new(test_config())
            .await
            .expect("pool creation should succeed");

        let record = FileRecord::new("notes.txt", depot_core::storage_name("notes.txt"), 12, "text/plain");
        let inserted = catalog
            .insert_batch(std::slice::from_ref(&record))
            .await
            .expect("insert should succeed");
        assert_eq!(inserted, 1);

        let found = catalog
            .find_by_ids(std::slice::from_ref(&record.id))
            .await
            .expect("lookup should succeed");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file, record.file);
        assert!(found[0].last_read.is_none());

        catalog
            .touch_last_read(std::slice::from_ref(&record.id), Utc::now())
            .await
            .expect("touch should succeed");

        let touched = catalog
            .find_by_ids(std::slice::from_ref(&record.id))
            .await
            .expect("lookup should succeed");
        assert!(touched[0].last_read.is_some());
    }

    #[tokio::test]
    async fn empty_sets_short_circuit() {
        let catalog = PostgresCatalog::new(test_config())
            .await
            .expect("pool creation should succeed");

        assert!(catalog.find_by_ids(&[]).await.unwrap().is_empty());
        catalog.touch_last_read(&[], Utc::now()).await.unwrap();
        assert_eq!(catalog.insert_batch(&[]).await.unwrap(), 0);
    }
}
