use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{logging_middleware, metrics_middleware, rate_limit_middleware};
use super::state::AppState;
use super::{analytics, cache, chat, health};

/// Builds the HTTP surface.
///
/// Only the chat routes are rate limited; health, analytics and cache
/// administration are not. The chat body limit follows the configured
/// image and message limits instead of axum's 2 MB default.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let ai = Router::new()
        .route("/chat", post(chat::chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.limits.max_body_bytes()));

    Router::new()
        .nest("/api/ai", ai)
        .route("/api/health", get(health::health_check))
        .route("/api/analytics", get(analytics::summary))
        .route("/api/analytics/searches", get(analytics::recent_searches))
        .route("/api/analytics/errors", get(analytics::recent_errors))
        .route("/api/cache/stats", get(cache::stats))
        .route("/api/cache/flush", post(cache::flush))
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
}

/// Any origin when the list is empty or contains `*`
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    cors.allow_origin(origins)
}
