use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration for the depot server, loaded from a TOML file.
///
/// Every value is coerced to its final type here, once, at startup; nothing
/// downstream reads raw strings or re-parses booleans.
#[derive(Debug, Default, Deserialize)]
pub struct DepotConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Physical storage directories.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation limits.
    #[serde(default)]
    pub files: FilesConfig,
    /// Relational catalog backend.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Redis cache backend.
    #[serde(default)]
    pub cache: CacheConfig,
    /// When enabled, error responses carry backend detail in an `error`
    /// field. Production deployments leave this off.
    #[serde(default)]
    pub debug: bool,
}

impl DepotConfig {
    /// Request body ceiling: the whole batch at its limits plus multipart
    /// framing overhead.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        let payload = self.files.max_size.saturating_mul(self.files.max_files as u64);
        usize::try_from(payload).unwrap_or(usize::MAX).saturating_add(1024 * 1024)
    }
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

/// Physical storage layout.
///
/// The uploads directory is the hot tier written by ingestion; the archive
/// directory is the cold tier an external relocation process moves aged
/// files into; the scratch directory holds per-request archive artifacts
/// and is empty between requests.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            archive_dir: default_archive_dir(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("data/uploads")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("data/archive")
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("data/scratch")
}

/// Upload validation limits.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Maximum number of files accepted per upload batch.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
    /// Accepted media types, as declared by the client.
    #[serde(default = "default_supported")]
    pub supported: Vec<String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_size: default_max_size(),
            supported: default_supported(),
        }
    }
}

fn default_max_files() -> usize {
    5
}

fn default_max_size() -> u64 {
    10 * 1024 * 1024
}

fn default_supported() -> Vec<String> {
    [
        "text/plain",
        "text/csv",
        "application/pdf",
        "application/zip",
        "application/octet-stream",
        "image/png",
        "image/jpeg",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Relational catalog backend configuration.
#[derive(Debug, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    #[serde(default = "default_catalog_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_catalog_schema")]
    pub schema: String,
    #[serde(default = "default_catalog_table_prefix")]
    pub table_prefix: String,
    #[serde(default = "default_catalog_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            pool_size: default_catalog_pool_size(),
            schema: default_catalog_schema(),
            table_prefix: default_catalog_table_prefix(),
            acquire_timeout_seconds: default_catalog_acquire_timeout(),
        }
    }
}

impl CatalogConfig {
    /// Render into the backend crate's config type.
    #[must_use]
    pub fn to_postgres_config(&self) -> depot_catalog_postgres::PostgresConfig {
        depot_catalog_postgres::PostgresConfig {
            url: self.url.clone(),
            pool_size: self.pool_size,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_seconds),
            schema: self.schema.clone(),
            table_prefix: self.table_prefix.clone(),
        }
    }
}

fn default_catalog_url() -> String {
    "postgres://localhost:5432/depot".to_owned()
}

fn default_catalog_pool_size() -> u32 {
    5
}

fn default_catalog_schema() -> String {
    "public".to_owned()
}

fn default_catalog_table_prefix() -> String {
    "depot_".to_owned()
}

fn default_catalog_acquire_timeout() -> u64 {
    5
}

/// Redis cache backend configuration.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_url")]
    pub url: String,
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,
    #[serde(default = "default_cache_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_cache_connection_timeout")]
    pub connection_timeout_seconds: u64,
    /// Entry time-to-live. Defaults to 24 hours.
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
            prefix: default_cache_prefix(),
            pool_size: default_cache_pool_size(),
            connection_timeout_seconds: default_cache_connection_timeout(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    /// Render into the backend crate's config type.
    #[must_use]
    pub fn to_redis_config(&self) -> depot_cache_redis::RedisConfig {
        depot_cache_redis::RedisConfig {
            url: self.url.clone(),
            prefix: self.prefix.clone(),
            pool_size: self.pool_size,
            connection_timeout: Duration::from_secs(self.connection_timeout_seconds),
        }
    }

    /// Entry time-to-live as a [`Duration`].
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn default_cache_url() -> String {
    "redis://127.0.0.1:6379".to_owned()
}

fn default_cache_prefix() -> String {
    "depot".to_owned()
}

fn default_cache_pool_size() -> usize {
    10
}

fn default_cache_connection_timeout() -> u64 {
    5
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}
