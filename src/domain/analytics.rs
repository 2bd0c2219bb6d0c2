//! Analytics events recorded per request

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use uuid::Uuid;

use super::chat::ChatMode;
use super::classification::{QueryClassification, Strategy};
use super::error_classification::{ClassifiedError, ErrorCategory};

/// One completed request, successful or not
#[derive(Debug, Clone, Serialize)]
pub struct SearchEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub mode: ChatMode,
    pub has_image: bool,
    pub classification: QueryClassification,
    pub strategy: Strategy,
    pub response_time_ms: u64,
    pub success: bool,
    pub cache_hit: bool,
    pub model_used: String,
    pub response_length: usize,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
}

/// A classified failure, recorded alongside the failed `SearchEvent`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub mode: ChatMode,
    pub category: ErrorCategory,
    pub http_status: u16,
    pub technical_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ErrorEvent {
    pub fn new(
        query: impl Into<String>,
        mode: ChatMode,
        error: &ClassifiedError,
        provider: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: query.into(),
            mode,
            category: error.category,
            http_status: error.http_status,
            technical_message: error.technical_message.clone(),
            provider,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AnalyticsEvent {
    Search(SearchEvent),
    Error(ErrorEvent),
}

/// Fire-and-forget analytics sink.
///
/// Implementations must not block for long and must never panic or
/// propagate failures back to the caller.
#[cfg_attr(test, automock)]
pub trait EventSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}
