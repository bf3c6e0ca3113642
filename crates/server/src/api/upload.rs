use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;
use crate::ingest::{IncomingFile, IngestError, ingest};

/// Fallback name and type for files arriving as a raw base64 string, which
/// carries no metadata of its own.
const BASE64_NAME: &str = "upload.bin";
const BASE64_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
struct Base64Form {
    file: Option<String>,
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Files",
    summary = "Upload files",
    description = "Accepts a multipart/form-data batch, or a single base64-encoded \
                   file in a urlencoded `file` field. Returns the stored records.",
    request_body(content = String, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored file records", body = [depot_core::FileRecord]),
        (status = 400, description = "Empty batch, validation failure, or insert failure", body = super::schemas::ErrorResponse)
    )
)]
pub async fn upload(State(state): State<AppState>, request: Request) -> Result<impl IntoResponse, ApiError> {
    let debug = state.config.debug;

    let files = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::upload(&e, debug))?;
        collect_multipart(multipart, debug).await?
    } else {
        collect_base64(request, debug).await?
    };

    if files.is_empty() {
        return Err(ApiError::NoFiles);
    }

    let records = ingest(
        state.catalog.as_ref(),
        &state.config.files,
        &state.config.storage.uploads_dir,
        files,
    )
    .await
    .map_err(|e| match e {
        IngestError::Invalid(report) => ApiError::Validation(report),
        IngestError::Catalog(_) => ApiError::Insert,
        IngestError::Io(io) => ApiError::upload(&io, debug),
    })?;

    Ok((StatusCode::OK, Json(records)))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

/// Drain every file-bearing multipart field into memory.
async fn collect_multipart(
    mut multipart: Multipart,
    debug: bool,
) -> Result<Vec<IncomingFile>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::upload(&e, debug))?
    {
        let Some(name) = field.file_name().map(str::to_owned) else {
            // Plain form values ride along with the files; ignore them.
            continue;
        };
        let media_type = field
            .content_type()
            .map_or_else(|| BASE64_TYPE.to_owned(), str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::upload(&e, debug))?;
        files.push(IncomingFile {
            name,
            media_type,
            bytes,
        });
    }
    Ok(files)
}

/// Decode a urlencoded body carrying the file as a base64 `file` field.
///
/// Urlencoding turns `+` into a space, so spaces are folded back before
/// decoding.
async fn collect_base64(request: Request, debug: bool) -> Result<Vec<IncomingFile>, ApiError> {
    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| ApiError::upload(&e, debug))?;
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let form: Base64Form =
        serde_urlencoded::from_bytes(&body).map_err(|e| ApiError::upload(&e, debug))?;
    let Some(encoded) = form.file else {
        return Ok(Vec::new());
    };

    let decoded = BASE64
        .decode(encoded.replace(' ', "+"))
        .map_err(|e| ApiError::upload(&e, debug))?;

    Ok(vec![IncomingFile {
        name: BASE64_NAME.to_owned(),
        media_type: BASE64_TYPE.to_owned(),
        bytes: Bytes::from(decoded),
    }])
}
