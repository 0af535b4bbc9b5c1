use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::{downloads, handlers, middleware::metrics_middleware, tracks, youtube};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Extracted audio, addressed by the `downloads/<file>` paths stored on tracks
    let downloads_dir = ServeDir::new(state.downloads_dir());

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Download jobs
        .route("/downloads", post(downloads::enqueue_download))
        .route("/downloads/bulk", post(downloads::enqueue_bulk))
        .route("/downloads/jobs", get(downloads::list_jobs))
        .route("/downloads/jobs/{id}", get(downloads::get_job))
        .route("/downloads/logs/stream", get(downloads::stream_logs))
        // Direct media URLs
        .route("/youtube/direct-download", post(youtube::direct_download))
        // Tracks
        .route("/tracks/{id}", get(tracks::get_track));

    Router::new()
        .nest("/api", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .nest_service("/downloads", downloads_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
