use thiserror::Error;

/// Errors from cache layer operations.
///
/// The cache is a read-through accelerator, never a source of truth, so
/// callers on the retrieval path treat any of these as a miss rather than
/// a request failure.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
