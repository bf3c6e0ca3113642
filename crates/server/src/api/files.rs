use axum::body::Body;
use axum::extract::{Path as AxumPath, RawQuery, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use depot_core::{FileId, FileRecord, filter_ids};

use super::AppState;
use crate::bundle::{ArchiveEntry, bundle};
use crate::error::ApiError;
use crate::storage::locate;

/// Name of the archive produced when more than one file is requested.
const ARCHIVE_NAME: &str = "uploads.zip";

#[utoipa::path(
    get,
    path = "/{ids}",
    tag = "Files",
    summary = "Download files by id",
    description = "Streams a single file as-is, or bundles several into a ZIP archive. \
                   Ids are comma-separated 32-character lowercase hex strings.",
    params(
        ("ids" = String, Path, description = "Comma-separated file ids")
    ),
    responses(
        (status = 200, description = "File content or ZIP archive"),
        (status = 400, description = "No valid id in the request", body = super::schemas::ErrorResponse),
        (status = 404, description = "No file found for any id", body = super::schemas::ErrorResponse)
    )
)]
pub async fn download(
    State(state): State<AppState>,
    AxumPath(ids): AxumPath<String>,
) -> Result<Response, ApiError> {
    fetch(&state, filter_ids(ids.split(','))).await
}

/// Same retrieval path, with the ids carried in `id` query parameters.
///
/// The parameter may be repeated (`?id=a&id=b`, PHP-style `id[]=` included)
/// and each value may itself be a comma-separated list; all values are
/// pooled before filtering. A query that does not parse as key-value pairs
/// is just another form of invalid id.
pub async fn download_query(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let raw = query.unwrap_or_default();
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(&raw).map_err(|_| ApiError::InvalidId)?;

    let candidates = pairs
        .iter()
        .filter(|(key, _)| key == "id" || key == "id[]")
        .flat_map(|(_, value)| value.split(','));

    fetch(&state, filter_ids(candidates)).await
}

async fn fetch(state: &AppState, ids: Vec<FileId>) -> Result<Response, ApiError> {
    let debug = state.config.debug;

    if ids.is_empty() {
        return Err(ApiError::InvalidId);
    }

    let records = state
        .resolver
        .resolve(&ids)
        .await
        .map_err(|e| ApiError::retrieval(&e, debug))?;
    if records.is_empty() {
        return Err(ApiError::NotFound);
    }

    if let [record] = records.as_slice() {
        return stream_single(state, record).await;
    }
    stream_archive(state, &records).await
}

/// Stream one file straight off disk with its original name and type.
async fn stream_single(state: &AppState, record: &FileRecord) -> Result<Response, ApiError> {
    let debug = state.config.debug;
    let storage = &state.config.storage;

    let located = locate(&record.file, &storage.uploads_dir, &storage.archive_dir)
        .await
        .ok_or(ApiError::NotFound)?;

    let file = tokio::fs::File::open(located.into_path())
        .await
        .map_err(|e| ApiError::retrieval(&e, debug))?;

    Response::builder()
        .header(CONTENT_TYPE, record.media_type.as_str())
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename={}", record.name),
        )
        .header(CONTENT_LENGTH, record.size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::retrieval(&e, debug))
}

/// Bundle every locatable file into a scratch ZIP and stream it out.
///
/// Records whose physical file has gone missing are skipped, matching the
/// single-file path's tolerance for catalog rows that outlive their bytes.
async fn stream_archive(state: &AppState, records: &[FileRecord]) -> Result<Response, ApiError> {
    let debug = state.config.debug;
    let storage = &state.config.storage;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        if let Some(located) = locate(&record.file, &storage.uploads_dir, &storage.archive_dir).await
        {
            entries.push(ArchiveEntry {
                path: located.into_path(),
                name: record.name.clone(),
            });
        }
    }
    if entries.is_empty() {
        return Err(ApiError::NotFound);
    }

    let (archive, len) = bundle(entries, &storage.scratch_dir)
        .await
        .map_err(|e| ApiError::retrieval(&e, debug))?;

    Response::builder()
        .header(CONTENT_TYPE, "application/zip")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename={ARCHIVE_NAME}"),
        )
        .header(CONTENT_LENGTH, len)
        .body(Body::from_stream(ReaderStream::new(archive)))
        .map_err(|e| ApiError::retrieval(&e, debug))
}
