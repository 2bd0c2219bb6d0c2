//! Cache administration endpoints

use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::infrastructure::cache::CacheStats;

#[derive(Debug, Serialize)]
pub struct FlushResponse {
    pub flushed: bool,
    pub stats: CacheStats,
}

/// GET /api/cache/stats
pub async fn stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// POST /api/cache/flush - empties both pools; hit and miss counters are kept
pub async fn flush(State(state): State<AppState>) -> Json<FlushResponse> {
    state.cache.flush().await;

    Json(FlushResponse {
        flushed: true,
        stats: state.cache.stats().await,
    })
}
