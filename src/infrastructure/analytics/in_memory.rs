//! In-memory analytics event log

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::domain::{AnalyticsEvent, ErrorEvent, EventSink, SearchEvent};

/// Event log configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Events retained per kind; the oldest are dropped first
    pub max_events: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self { max_events: 1000 }
    }
}

/// Aggregates over the retained search and error events
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub total_searches: usize,
    pub successful_searches: usize,
    pub failed_searches: usize,
    pub success_rate: f64,
    pub cache_hits: usize,
    pub cache_hit_rate: f64,
    pub degraded_responses: usize,
    pub average_response_time_ms: f64,
    pub total_errors: usize,
    pub by_query_type: BTreeMap<String, usize>,
    pub by_strategy: BTreeMap<String, usize>,
    pub errors_by_category: BTreeMap<String, usize>,
}

/// Bounded ring buffers of recent events.
///
/// `record` holds a write lock only for a push and never panics, even if a
/// reader panicked while holding the lock.
#[derive(Debug)]
pub struct InMemoryEventLog {
    searches: RwLock<VecDeque<SearchEvent>>,
    errors: RwLock<VecDeque<ErrorEvent>>,
    max_events: usize,
    closed: AtomicBool,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn push_bounded<T>(buffer: &mut VecDeque<T>, item: T, max: usize) {
    if max == 0 {
        return;
    }
    while buffer.len() >= max {
        buffer.pop_front();
    }
    buffer.push_back(item);
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl InMemoryEventLog {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            searches: RwLock::new(VecDeque::with_capacity(config.max_events.min(1024))),
            errors: RwLock::new(VecDeque::new()),
            max_events: config.max_events,
            closed: AtomicBool::new(false),
        }
    }

    /// Most recent search events, newest first
    pub fn recent_searches(&self, limit: usize) -> Vec<SearchEvent> {
        read(&self.searches).iter().rev().take(limit).cloned().collect()
    }

    /// Most recent error events, newest first
    pub fn recent_errors(&self, limit: usize) -> Vec<ErrorEvent> {
        read(&self.errors).iter().rev().take(limit).cloned().collect()
    }

    pub fn summary(&self) -> AnalyticsSummary {
        let mut summary = AnalyticsSummary::default();
        let mut total_time_ms: u64 = 0;

        for event in read(&self.searches).iter() {
            summary.total_searches += 1;
            total_time_ms += event.response_time_ms;

            if event.success {
                summary.successful_searches += 1;
            } else {
                summary.failed_searches += 1;
            }
            if event.cache_hit {
                summary.cache_hits += 1;
            }
            if event.degraded {
                summary.degraded_responses += 1;
            }

            *summary
                .by_query_type
                .entry(event.classification.query_type.as_str().to_string())
                .or_default() += 1;
            *summary
                .by_strategy
                .entry(event.strategy.as_str().to_string())
                .or_default() += 1;
        }

        for event in read(&self.errors).iter() {
            summary.total_errors += 1;
            *summary
                .errors_by_category
                .entry(event.category.as_str().to_string())
                .or_default() += 1;
        }

        summary.success_rate = ratio(summary.successful_searches, summary.total_searches);
        summary.cache_hit_rate = ratio(summary.cache_hits, summary.total_searches);
        if summary.total_searches > 0 {
            summary.average_response_time_ms =
                total_time_ms as f64 / summary.total_searches as f64;
        }

        summary
    }

    /// Stops accepting events and drops retained ones
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        write(&self.searches).clear();
        write(&self.errors).clear();
    }
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl EventSink for InMemoryEventLog {
    fn record(&self, event: AnalyticsEvent) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }

        match event {
            AnalyticsEvent::Search(event) => {
                push_bounded(&mut write(&self.searches), event, self.max_events)
            }
            AnalyticsEvent::Error(event) => {
                push_bounded(&mut write(&self.errors), event, self.max_events)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ChatMode, ClassifiedError, ErrorCategory, QueryClassifier, ClassifierConfig,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn search(query: &str, success: bool, cache_hit: bool, response_time_ms: u64) -> SearchEvent {
        let classification = QueryClassifier::new(ClassifierConfig::default()).classify(query, false);

        SearchEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            query: query.to_string(),
            mode: ChatMode::DeepSearch,
            has_image: false,
            strategy: classification.strategy,
            classification,
            response_time_ms,
            success,
            cache_hit,
            model_used: "sonar".to_string(),
            response_length: 10,
            degraded: false,
            error_category: (!success).then_some(ErrorCategory::Timeout),
        }
    }

    fn error(category: ErrorCategory) -> ErrorEvent {
        ErrorEvent::new(
            "q",
            ChatMode::Think,
            &ClassifiedError::new(category, "boom"),
            Some("search".to_string()),
        )
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let log = InMemoryEventLog::default();
        for query in ["first", "second", "third"] {
            log.record(AnalyticsEvent::Search(search(query, true, false, 10)));
        }

        let recent = log.recent_searches(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "third");
        assert_eq!(recent[1].query, "second");
    }

    #[test]
    fn test_buffer_is_bounded() {
        let log = InMemoryEventLog::new(AnalyticsConfig { max_events: 2 });
        for query in ["a", "b", "c"] {
            log.record(AnalyticsEvent::Search(search(query, true, false, 10)));
        }

        let recent = log.recent_searches(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].query, "b");
    }

    #[test]
    fn test_summary() {
        let log = InMemoryEventLog::default();
        log.record(AnalyticsEvent::Search(search("Canon PG-540", true, false, 100)));
        log.record(AnalyticsEvent::Search(search("Canon PG-540", true, true, 20)));
        log.record(AnalyticsEvent::Search(search("Canon PG-540", false, false, 300)));
        log.record(AnalyticsEvent::Error(error(ErrorCategory::Timeout)));

        let summary = log.summary();
        assert_eq!(summary.total_searches, 3);
        assert_eq!(summary.successful_searches, 2);
        assert_eq!(summary.failed_searches, 1);
        assert!((summary.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.cache_hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.average_response_time_ms, 140.0);
        assert_eq!(summary.by_query_type.get("simple"), Some(&3));
        assert_eq!(summary.by_strategy.get("search-only"), Some(&3));
        assert_eq!(summary.errors_by_category.get("timeout"), Some(&1));
    }

    #[test]
    fn test_empty_summary_has_zero_rates() {
        let summary = InMemoryEventLog::default().summary();
        assert_eq!(summary.total_searches, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_response_time_ms, 0.0);
    }

    #[test]
    fn test_shutdown_stops_recording() {
        let log = InMemoryEventLog::default();
        log.record(AnalyticsEvent::Error(error(ErrorCategory::Auth)));
        log.shutdown();
        log.record(AnalyticsEvent::Error(error(ErrorCategory::Auth)));

        assert!(log.recent_errors(10).is_empty());
    }
}
