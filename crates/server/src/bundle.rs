//! Bundling of multiple stored files into one streamable ZIP archive.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tracing::warn;
use uuid::Uuid;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// One file to include in an archive: its located physical path and the
/// display name it appears under inside the ZIP.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub name: String,
}

/// Errors from archive construction.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive task failed: {0}")]
    Task(String),
}

/// Build a ZIP archive of the given entries in the scratch directory and
/// return an open read handle plus the archive length.
///
/// The scratch file gets a fresh UUIDv7 name, so concurrent requests never
/// share an artifact, and it is unlinked as soon as the read handle is open:
/// the bytes stay readable until the response stream drops the handle, and
/// the disk space is reclaimed on every exit path, including client
/// disconnect mid-stream.
///
/// Entries that cannot be read are skipped with a warning. Callers are
/// expected to have located every entry already and to surface "not found"
/// themselves when nothing is resolvable.
pub async fn bundle(entries: Vec<ArchiveEntry>, scratch_dir: &Path) -> Result<(File, u64), BundleError> {
    let scratch_path = scratch_dir.join(format!("{}.zip", Uuid::now_v7().simple()));

    match write_and_open(entries, &scratch_path).await {
        Ok(opened) => Ok(opened),
        Err(e) => {
            // Best-effort removal so a failed build leaves no artifact behind.
            if let Err(cleanup) = tokio::fs::remove_file(&scratch_path).await {
                warn!(path = %scratch_path.display(), error = %cleanup, "failed to remove scratch archive");
            }
            Err(e)
        }
    }
}

async fn write_and_open(entries: Vec<ArchiveEntry>, scratch_path: &Path) -> Result<(File, u64), BundleError> {
    let path = scratch_path.to_owned();
    tokio::task::spawn_blocking(move || write_archive(&entries, &path))
        .await
        .map_err(|e| BundleError::Task(e.to_string()))??;

    let file = File::open(scratch_path).await?;
    let len = file.metadata().await?.len();
    tokio::fs::remove_file(scratch_path).await?;

    Ok((file, len))
}

// The zip crate is synchronous; this runs on the blocking pool.
fn write_archive(entries: &[ArchiveEntry], path: &Path) -> Result<(), BundleError> {
    let file = std::fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match std::fs::File::open(&entry.path) {
            Ok(mut src) => {
                zip.start_file(entry.name.as_str(), options)?;
                std::io::copy(&mut src, &mut zip)?;
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "skipping unreadable archive entry");
            }
        }
    }

    zip.finish()?;
    Ok(())
}
