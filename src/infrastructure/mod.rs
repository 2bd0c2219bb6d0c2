//! Infrastructure layer - External service implementations

pub mod analytics;
pub mod cache;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod orchestrator;
pub mod rate_limit;
