//! Health endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::infrastructure::cache::CacheStats;
use crate::infrastructure::llm::ProviderStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    /// Which backends have credentials
    pub providers: ProviderStatus,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but at least one backend lacks credentials
    Degraded,
}

impl HealthStatus {
    fn from_providers(status: &ProviderStatus) -> Self {
        if status.search && status.reasoning && status.unified && status.vision {
            Self::Healthy
        } else {
            Self::Degraded
        }
    }
}

/// Always 200 while the process serves requests; `status` reports
/// missing backends
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.orchestrator.providers().status;

    let response = HealthResponse {
        status: HealthStatus::from_providers(&providers),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        providers,
        cache: state.cache.stats().await,
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_degrades_when_any_backend_missing() {
        let all = ProviderStatus {
            search: true,
            reasoning: true,
            unified: true,
            vision: true,
        };
        assert_eq!(HealthStatus::from_providers(&all), HealthStatus::Healthy);

        let no_vision = ProviderStatus {
            vision: false,
            ..all
        };
        assert_eq!(HealthStatus::from_providers(&no_vision), HealthStatus::Degraded);
    }
}
