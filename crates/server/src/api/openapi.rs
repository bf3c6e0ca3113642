use axum::Json;

use depot_core::FileRecord;

use super::schemas::{ErrorResponse, HealthResponse};
use crate::ingest::{ValidationIssue, ValidationReport};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Depot File Service API",
        version = "0.1.0",
        description = "HTTP API for uploading files and retrieving them individually or as ZIP archives.",
        license(name = "MIT")
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Files", description = "File upload and retrieval")
    ),
    paths(
        super::health::health,
        super::files::download,
        super::upload::upload,
    ),
    components(schemas(
        FileRecord,
        HealthResponse,
        ErrorResponse,
        ValidationReport,
        ValidationIssue,
    ))
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi as _;
    Json(ApiDoc::openapi())
}
