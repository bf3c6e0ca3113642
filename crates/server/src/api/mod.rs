pub mod files;
pub mod health;
pub mod openapi;
pub mod schemas;
pub mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use depot_cache::CacheStore;
use depot_catalog::CatalogStore;

use crate::config::DepotConfig;
use crate::resolve::Resolver;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside record resolution.
    pub resolver: Arc<Resolver>,
    /// Catalog backend, used directly by ingestion and health.
    pub catalog: Arc<dyn CatalogStore>,
    /// Cache backend, used directly by health.
    pub cache: Arc<dyn CacheStore>,
    /// Full service configuration.
    pub config: Arc<DepotConfig>,
}

/// Build the Axum router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit();

    Router::new()
        .route("/health", get(health::health))
        .route("/api-doc/openapi.json", get(openapi::openapi_json))
        .route(
            "/",
            get(files::download_query).post(upload::upload),
        )
        .route("/{ids}", get(files::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
