//! Time source for cache expiry

use std::fmt::Debug;

use chrono::{DateTime, Utc};

/// Source of the current time, injectable so expiry can be tested
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
