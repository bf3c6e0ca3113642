use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating the upload table if it does not exist.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let upload_table = config.upload_table();

    // `id` is 32 lowercase hex chars derived from `file`; both are immutable
    // after insert. `last_read` is the only mutable column.
    let create_upload = format!(
        "CREATE TABLE IF NOT EXISTS {upload_table} (
            id CHAR(32) PRIMARY KEY,
            name TEXT NOT NULL,
            file TEXT NOT NULL UNIQUE,
            size BIGINT NOT NULL,
            type TEXT NOT NULL,
            last_read TIMESTAMPTZ
        )"
    );

    // Retention tooling scans by recency of access.
    let create_last_read_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}upload_last_read_idx ON {upload_table} (last_read)",
        config.table_prefix
    );

    sqlx::query(&create_upload).execute(pool).await?;
    sqlx::query(&create_last_read_idx).execute(pool).await?;

    Ok(())
}
