use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use super::middleware::metrics_middleware;
use super::{analysis, handlers, media};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let storage = state.config().storage.clone();

    // API routes
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Analysis
        .route("/analyze-video", post(analysis::analyze_video))
        .route("/progress/{id}", get(analysis::get_progress))
        // Published media
        .route("/audio/{id}", get(media::get_audio))
        .route("/video/{id}", get(media::get_video))
        .route("/thumbnail/{id}", get(media::get_thumbnail));

    Router::new()
        .route("/", get(handlers::root))
        .route("/metrics", get(handlers::metrics))
        // Clients that poll without the /api prefix
        .route("/progress/{id}", get(analysis::get_progress))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(&storage.static_dir))
        .nest_service("/videos", ServeDir::new(&storage.videos_dir))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
