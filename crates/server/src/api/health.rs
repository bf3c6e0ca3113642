use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;

use super::AppState;
use super::schemas::HealthResponse;

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Reports whether the catalog database and the cache are reachable.",
    responses(
        (status = 200, description = "Service status with backend reachability", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.catalog.ping().await;
    let redis = state.cache.health_check().await;

    let body = HealthResponse {
        status: "ok".to_owned(),
        database,
        redis,
        actual_date: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    };

    (StatusCode::OK, Json(body))
}
