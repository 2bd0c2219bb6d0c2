//! Per-client request throttling

mod limiter;

pub use limiter::{RateLimitConfig, RateLimitResult, RateLimiter};
