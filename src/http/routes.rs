//! Axum router configuration

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{
    cache_stats, download, health_check, parse_subtitles, subtitles, tracks, version_check,
    video_info, youtube_proxy,
};
use super::middleware::request_logger;

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.cors_enabled;

    let mut router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Debug endpoints
        .route("/debug/cache", get(cache_stats))
        // API
        .route("/api/video-info", get(video_info))
        .route("/api/subtitles", get(subtitles))
        .route("/api/tracks", get(tracks))
        .route("/api/parse-subtitles", post(parse_subtitles))
        .route("/api/download", get(download))
        // Passthrough to the video site
        .route("/youtube-proxy/{*path}", get(youtube_proxy))
        // Middleware
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::ACCEPT,
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ORIGIN,
            ])
            .expose_headers([header::CONTENT_DISPOSITION])
            .max_age(Duration::from_secs(3600));
        router = router.layer(cors);
    }

    router.with_state(state)
}
