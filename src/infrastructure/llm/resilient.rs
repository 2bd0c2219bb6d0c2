//! Timeout and retry wrapper around any provider

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::{DomainError, ErrorClassifier, Provider, ProviderInput, ProviderRole};
use crate::infrastructure::observability::record_provider_call;

/// Retry policy for provider calls; defaults to a single attempt
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 250,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    /// Delay before retry number `retry` (0-indexed), capped at `max_delay_ms`
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(retry as i32);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }
}

/// Bounds each call with a deadline and retries transient failures.
///
/// Only rate-limit, unavailable and timeout failures are retried.
#[derive(Debug)]
pub struct ResilientProvider {
    inner: Arc<dyn Provider>,
    role: ProviderRole,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ResilientProvider {
    pub fn new(
        inner: Arc<dyn Provider>,
        role: ProviderRole,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            inner,
            role,
            timeout,
            retry,
        }
    }

    async fn attempt(&self, input: ProviderInput) -> Result<String, DomainError> {
        let start = Instant::now();

        let result = match timeout(self.timeout, self.inner.call(input)).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::timeout(
                self.inner.name(),
                self.timeout.as_millis() as u64,
            )),
        };

        record_provider_call(
            self.role.as_str(),
            self.inner.model(),
            start.elapsed(),
            result.is_ok(),
        );

        result
    }
}

#[async_trait]
impl Provider for ResilientProvider {
    async fn call(&self, input: ProviderInput) -> Result<String, DomainError> {
        let max_attempts = self.retry.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.attempt(input.clone()).await {
                Ok(text) => {
                    debug!(role = %self.role, provider = self.inner.name(), attempt, "Provider call succeeded");
                    return Ok(text);
                }
                Err(e) => e,
            };

            let retryable = ErrorClassifier.classify(&error).category.is_retryable();
            if !retryable || attempt >= max_attempts {
                return Err(error);
            }

            let delay = self.retry.delay_for_retry(attempt - 1);
            warn!(
                role = %self.role,
                provider = self.inner.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Provider call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::mock::MockProvider;

    fn wrap(inner: MockProvider, timeout_ms: u64, retry: RetryPolicy) -> (ResilientProvider, Arc<MockProvider>) {
        let inner = Arc::new(inner);
        let provider = ResilientProvider::new(
            inner.clone(),
            ProviderRole::Search,
            Duration::from_millis(timeout_ms),
            retry,
        );
        (provider, inner)
    }

    #[test]
    fn test_delay_calculation() {
        let policy = RetryPolicy::new(3).with_initial_delay(100);

        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_retry(10), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_default_policy_makes_one_attempt() {
        let (provider, inner) = wrap(
            MockProvider::failing("search", |p| DomainError::unavailable(p, "503")),
            1000,
            RetryPolicy::default(),
        );

        assert!(provider.call(ProviderInput::new("q")).await.is_err());
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let (provider, inner) = wrap(
            MockProvider::failing("search", |p| DomainError::rate_limited(p, "429", None)),
            1000,
            RetryPolicy::new(2).with_initial_delay(1),
        );

        assert!(provider.call(ProviderInput::new("q")).await.is_err());
        assert_eq!(inner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_auth_failures() {
        let (provider, inner) = wrap(
            MockProvider::failing("search", |p| DomainError::authentication(p, "401")),
            1000,
            RetryPolicy::new(3).with_initial_delay(1),
        );

        let err = provider.call(ProviderInput::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::Authentication { .. }));
        assert_eq!(inner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let (provider, _) = wrap(
            MockProvider::new("search", "late").with_delay(Duration::from_millis(500)),
            20,
            RetryPolicy::default(),
        );

        let err = provider.call(ProviderInput::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout { timeout_ms: 20, .. }));
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let (provider, _) = wrap(MockProvider::new("search", "svar"), 1000, RetryPolicy::default());

        assert_eq!(provider.call(ProviderInput::new("q")).await.unwrap(), "svar");
        assert_eq!(provider.name(), "search");
    }
}
