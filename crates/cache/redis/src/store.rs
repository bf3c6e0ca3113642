use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use depot_cache::error::CacheError;
use depot_cache::store::CacheStore;
use depot_core::{FileId, FileRecord};

use crate::config::RedisConfig;

/// Redis-backed implementation of [`CacheStore`].
///
/// Uses a `deadpool-redis` connection pool. Records are stored as JSON
/// strings under `{prefix}:upload:{id}` with a per-entry TTL (`SET ... EX`),
/// so expiry is handled entirely by Redis.
pub struct RedisCache {
    pool: Pool,
    prefix: String,
    connection_timeout: Duration,
}

impl RedisCache {
    /// Create a new `RedisCache` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CacheError::Connection(e.to_string()))?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            connection_timeout: config.connection_timeout,
        })
    }

    /// Build the full Redis key for a file id.
    fn render_key(&self, id: &FileId) -> String {
        format!("{}:upload:{}", self.prefix, id)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, id: &FileId) -> Result<Option<FileRecord>, CacheError> {
        let key = self.render_key(id);
        let mut conn = self.conn().await?;

        let raw: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        match raw {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, record: &FileRecord, ttl: Duration) -> Result<(), CacheError> {
        let key = self.render_key(&record.id);
        let payload =
            serde_json::to_string(record).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.conn().await?;
        let () = conn
            .set_ex(&key, payload, ttl.as_secs().max(1))
            .await
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn health_check(&self) -> bool {
        let probe = async {
            let mut conn = self.conn().await?;
            redis::cmd("PING")
                .query_async::<String>(&mut conn)
                .await
                .map_err(|e| CacheError::Backend(e.to_string()))
        };

        match tokio::time::timeout(self.connection_timeout, probe).await {
            Ok(Ok(reply)) => reply == "PONG",
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "cache health check failed");
                false
            }
            Err(_) => {
                tracing::debug!("cache health check timed out");
                false
            }
        }
    }
}
