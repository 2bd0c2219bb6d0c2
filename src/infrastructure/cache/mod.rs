//! Cache infrastructure - Cache implementations

mod in_memory;
mod result_cache;

pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use result_cache::{CachePool, CacheStats, PoolStats, ResultCache, ResultCacheConfig};
