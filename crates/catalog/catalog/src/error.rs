use thiserror::Error;

/// Errors from catalog store operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("batch insert wrote {inserted} of {expected} rows")]
    InsertMismatch { expected: u64, inserted: u64 },
}
