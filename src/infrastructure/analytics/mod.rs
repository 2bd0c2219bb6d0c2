//! Analytics event log implementations

mod in_memory;

pub use in_memory::{AnalyticsConfig, AnalyticsSummary, InMemoryEventLog};
