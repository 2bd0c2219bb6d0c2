//! Application state for shared services

use std::sync::Arc;
use std::time::Instant;

use crate::config::LimitsConfig;
use crate::infrastructure::analytics::InMemoryEventLog;
use crate::infrastructure::cache::ResultCache;
use crate::infrastructure::orchestrator::QueryOrchestrator;
use crate::infrastructure::rate_limit::RateLimiter;

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub cache: Arc<ResultCache>,
    pub events: Arc<InMemoryEventLog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub limits: LimitsConfig,
    /// Adds category and retry hints to error envelopes
    pub expose_error_details: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<QueryOrchestrator>,
        cache: Arc<ResultCache>,
        events: Arc<InMemoryEventLog>,
        rate_limiter: Arc<RateLimiter>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            orchestrator,
            cache,
            events,
            rate_limiter,
            limits,
            expose_error_details: false,
            started_at: Instant::now(),
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }
}
