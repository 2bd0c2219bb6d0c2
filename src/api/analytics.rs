//! Analytics read endpoints

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::types::Json;
use crate::domain::{ErrorEvent, SearchEvent};
use crate::infrastructure::analytics::AnalyticsSummary;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct SearchesResponse {
    pub searches: Vec<SearchEvent>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorsResponse {
    pub errors: Vec<ErrorEvent>,
    pub count: usize,
}

/// GET /api/analytics
pub async fn summary(State(state): State<AppState>) -> Json<AnalyticsSummary> {
    Json(state.events.summary())
}

/// GET /api/analytics/searches?limit=N, newest first
pub async fn recent_searches(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<SearchesResponse> {
    let searches = state.events.recent_searches(query.limit());

    Json(SearchesResponse {
        count: searches.len(),
        searches,
    })
}

/// GET /api/analytics/errors?limit=N, newest first
pub async fn recent_errors(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<ErrorsResponse> {
    let errors = state.events.recent_errors(query.limit());

    Json(ErrorsResponse {
        count: errors.len(),
        errors,
    })
}
