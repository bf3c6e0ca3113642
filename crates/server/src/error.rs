use std::fmt;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::ingest::ValidationReport;

/// Errors surfaced through the HTTP API.
///
/// Variants map one-to-one onto the wire bodies the service exposes. Backend
/// detail is captured at construction and only when debug mode is on, so
/// production responses never leak internal messages.
#[derive(Debug)]
pub enum ApiError {
    /// The filtered id set was empty.
    InvalidId,
    /// No record or no physical file for any requested id.
    NotFound,
    /// The upload request carried no files at all.
    NoFiles,
    /// Upload validation failed; the report is returned verbatim.
    Validation(ValidationReport),
    /// The catalog batch insert failed after validation passed.
    Insert,
    /// The retrieval path failed (catalog connectivity, disk, archive).
    Retrieval { detail: Option<String> },
    /// The upload transport failed (malformed multipart, bad base64).
    Upload { detail: Option<String> },
}

impl ApiError {
    /// Retrieval-path failure, carrying detail only in debug mode.
    pub fn retrieval(err: &dyn fmt::Display, debug: bool) -> Self {
        tracing::error!(error = %err, "retrieval failed");
        Self::Retrieval {
            detail: debug.then(|| err.to_string()),
        }
    }

    /// Upload-transport failure, carrying detail only in debug mode.
    pub fn upload(err: &dyn fmt::Display, debug: bool) -> Self {
        tracing::error!(error = %err, "upload failed");
        Self::Upload {
            detail: debug.then(|| err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::InvalidId => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "Invalid id" }),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": "File not found" }),
            ),
            Self::NoFiles => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "No files uploaded" }),
            ),
            Self::Validation(report) => (
                StatusCode::BAD_REQUEST,
                serde_json::to_value(report).unwrap_or_default(),
            ),
            Self::Insert => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "Error inserting data" }),
            ),
            Self::Retrieval { detail } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "Error retrieving file", "error": detail }),
            ),
            Self::Upload { detail } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": "Error uploading file", "error": detail }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_gated_behind_debug() {
        let err = std::io::Error::other("pool exhausted");

        let ApiError::Retrieval { detail } = ApiError::retrieval(&err, false) else {
            panic!("expected retrieval variant");
        };
        assert!(detail.is_none());

        let ApiError::Retrieval { detail } = ApiError::retrieval(&err, true) else {
            panic!("expected retrieval variant");
        };
        assert_eq!(detail.as_deref(), Some("pool exhausted"));
    }
}
