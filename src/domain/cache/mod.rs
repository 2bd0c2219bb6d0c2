//! Cache domain - Generic caching abstraction layer

mod clock;
mod key;
mod repository;

pub use clock::{Clock, SystemClock};
pub use key::{CacheKeyParams, normalize_query};
pub use repository::Cache;

#[cfg(test)]
pub use clock::mock::ManualClock;
#[cfg(test)]
pub use repository::mock::MockCache;
