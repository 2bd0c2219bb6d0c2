//! Product query router
//!
//! Classifies product questions and answers them through one of four
//! strategies over search, reasoning, unified and vision backends, with a
//! two-pool result cache, error classification and in-memory analytics.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::QueryClassifier;
use infrastructure::{
    analytics::InMemoryEventLog,
    cache::ResultCache,
    llm::ProviderFactory,
    orchestrator::QueryOrchestrator,
    rate_limit::RateLimiter,
};

/// Create application state from the default configuration sources
pub async fn create_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::load()?;
    create_app_state_with_config(&config).await
}

/// Wire providers, cache, analytics and the orchestrator from `config`
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let providers = ProviderFactory::create_set(&config.providers, config.limits.max_image_bytes)?;
    tracing::info!(status = ?providers.status, "Providers initialized");

    let cache = Arc::new(ResultCache::new(config.cache.clone()));
    let events = Arc::new(InMemoryEventLog::new(config.analytics.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

    let orchestrator = Arc::new(QueryOrchestrator::new(
        QueryClassifier::new(config.classifier.clone()),
        providers,
        cache.clone(),
        events.clone(),
        config.prompts.clone(),
    ));

    Ok(AppState::new(
        orchestrator,
        cache,
        events,
        rate_limiter,
        config.limits.clone(),
    )
    .with_error_details(config.server.expose_error_details))
}
