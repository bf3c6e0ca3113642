//! Validation and persistence of uploaded file batches.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use utoipa::ToSchema;

use depot_catalog::{CatalogError, CatalogStore};
use depot_core::{FileRecord, sanitize_name, storage_name};

use crate::config::FilesConfig;

/// One uploaded file, decoded from whichever transport carried it.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Client-supplied display name (unsanitized).
    pub name: String,
    /// Client-declared media type.
    pub media_type: String,
    /// File content.
    pub bytes: Bytes,
}

/// A single validation failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationIssue {
    /// What was wrong.
    #[schema(example = "File type not supported")]
    pub message: String,
    /// The offending file, when the issue is per-file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Outcome of validating an upload batch, returned verbatim on rejection.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    fn rejected(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: false,
            errors,
        }
    }
}

/// Errors from the ingestion path.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The batch failed validation; nothing was written.
    #[error("upload validation failed")]
    Invalid(ValidationReport),

    /// Writing bytes to the hot directory failed; already-written files of
    /// the batch have been removed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog batch insert failed; every written file of the batch has
    /// been removed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Validate an upload batch against the configured limits.
///
/// A batch over the file-count limit is rejected outright; otherwise every
/// file is checked and all failures are reported together.
#[must_use]
pub fn validate(files: &[IncomingFile], limits: &FilesConfig) -> ValidationReport {
    if files.len() > limits.max_files {
        return ValidationReport::rejected(vec![ValidationIssue {
            message: format!("Max {} files allowed", limits.max_files),
            filename: None,
        }]);
    }

    let mut errors = Vec::new();
    for file in files {
        if file.bytes.len() as u64 > limits.max_size {
            errors.push(ValidationIssue {
                message: format!("File too large (max {})", format_bytes(limits.max_size)),
                filename: Some(file.name.clone()),
            });
        }
        if !limits.supported.iter().any(|t| t == &file.media_type) {
            errors.push(ValidationIssue {
                message: "File type not supported".to_owned(),
                filename: Some(file.name.clone()),
            });
        }
    }

    if errors.is_empty() {
        ValidationReport::ok()
    } else {
        ValidationReport::rejected(errors)
    }
}

/// Persist an upload batch: write every file to the hot directory, then
/// insert all metadata rows in one catalog batch.
///
/// The write order makes the catalog row the commit point: bytes land on
/// disk first, and if the batch insert then fails or reports a row-count
/// mismatch, every written file of the batch is deleted before the error
/// surfaces, so no orphaned file ever exists without a catalog row.
///
/// # Errors
///
/// [`IngestError::Invalid`] when validation fails, [`IngestError::Io`] when
/// a write fails, [`IngestError::Catalog`] when the insert fails. The two
/// latter cases leave the hot directory without any file of this batch.
pub async fn ingest(
    catalog: &dyn CatalogStore,
    limits: &FilesConfig,
    uploads_dir: &Path,
    files: Vec<IncomingFile>,
) -> Result<Vec<FileRecord>, IngestError> {
    let report = validate(&files, limits);
    if !report.valid {
        return Err(IngestError::Invalid(report));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(files.len());
    let mut records: Vec<FileRecord> = Vec::with_capacity(files.len());

    for incoming in &files {
        let file = storage_name(&incoming.name);
        let path = uploads_dir.join(&file);
        if let Err(e) = tokio::fs::write(&path, &incoming.bytes).await {
            remove_written(&written).await;
            return Err(IngestError::Io(e));
        }
        written.push(path);
        records.push(FileRecord::new(
            sanitize_name(&incoming.name),
            file,
            incoming.bytes.len() as i64,
            incoming.media_type.clone(),
        ));
    }

    if let Err(e) = catalog.insert_batch(&records).await {
        remove_written(&written).await;
        return Err(IngestError::Catalog(e));
    }

    Ok(records)
}

/// Compensating cleanup after a failed batch.
async fn remove_written(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove file during rollback");
        }
    }
}

/// Render a byte count with a binary-ish unit for validation messages.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value.fract() == 0.0 {
        format!("{}{}", value as u64, UNITS[unit])
    } else {
        format!("{value:.2}{}", UNITS[unit])
    }
}
