use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Whether the catalog database answered a ping.
    #[schema(example = true)]
    pub database: bool,
    /// Whether the cache answered a ping.
    #[schema(example = true)]
    pub redis: bool,
    /// Server wall-clock time, UTC.
    #[schema(example = "2026-08-30 12:00:00")]
    pub actual_date: String,
}

/// Generic error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "File not found")]
    pub message: String,
    /// Backend detail, present only when debug mode is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
