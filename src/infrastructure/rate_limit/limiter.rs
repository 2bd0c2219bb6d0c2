//! Sliding window rate limiter keyed by client identity

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;

/// Rate limit configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_secs: u64,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_requests: 20,
        }
    }
}

impl RateLimitConfig {
    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Remaining requests in the current window
    pub remaining: u32,
    pub limit: u32,
    /// Seconds until the oldest request leaves the window
    pub reset_in_seconds: u64,
}

/// Sliding window limiter shared by all request handlers
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    records: RwLock<HashMap<String, VecDeque<Instant>>>,
    cleanup_interval: Duration,
    last_cleanup: RwLock<Instant>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: RwLock::new(HashMap::new()),
            cleanup_interval: Duration::from_secs(300),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks the limit for `client` and records the request if allowed
    pub async fn check_and_record(&self, client: &str) -> RateLimitResult {
        self.check_and_record_at(client, Instant::now()).await
    }

    async fn check_and_record_at(&self, client: &str, now: Instant) -> RateLimitResult {
        let limit = self.config.max_requests;

        if !self.config.enabled {
            return RateLimitResult {
                allowed: true,
                remaining: limit,
                limit,
                reset_in_seconds: 0,
            };
        }

        self.maybe_cleanup(now).await;

        let window = self.config.window();
        let mut records = self.records.write().await;
        let timestamps = records.entry(client.to_string()).or_default();

        while timestamps
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            timestamps.pop_front();
        }

        let reset_in_seconds = timestamps
            .front()
            .map(|t| window.saturating_sub(now.saturating_duration_since(*t)).as_secs().max(1))
            .unwrap_or(self.config.window_secs);

        if timestamps.len() as u32 >= limit {
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                limit,
                reset_in_seconds,
            };
        }

        timestamps.push_back(now);

        RateLimitResult {
            allowed: true,
            remaining: limit - timestamps.len() as u32,
            limit,
            reset_in_seconds,
        }
    }

    /// Drops clients whose every request has left the window
    async fn maybe_cleanup(&self, now: Instant) {
        {
            let last = self.last_cleanup.read().await;
            if now.saturating_duration_since(*last) < self.cleanup_interval {
                return;
            }
        }

        *self.last_cleanup.write().await = now;

        let window = self.config.window();
        let mut records = self.records.write().await;
        records.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|t| now.saturating_duration_since(*t) < window)
        });
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.records.read().await.len()
    }
}
