//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::DomainError;

/// String key/value cache with per-entry TTL
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a value; expired entries read as absent
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Sets a value, replacing any existing entry and resetting its TTL
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a value from the cache
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Clears all entries from the cache
    async fn clear(&self) -> Result<(), DomainError>;

    /// Returns approximate number of live entries
    async fn size(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records writes with their TTL; TTLs are not enforced. A failing
    /// instance rejects every operation.
    #[derive(Debug, Default)]
    pub struct MockCache {
        entries: Mutex<HashMap<String, (String, Duration)>>,
        failure: Option<String>,
    }

    impl MockCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing(reason: impl Into<String>) -> Self {
            Self {
                failure: Some(reason.into()),
                ..Self::default()
            }
        }

        /// TTL passed with the last write of `key`
        pub fn ttl_of(&self, key: &str) -> Option<Duration> {
            self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
        }

        fn available(&self) -> Result<(), DomainError> {
            match &self.failure {
                Some(reason) => Err(DomainError::cache(reason.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
            self.available()?;
            Ok(self.entries.lock().unwrap().get(key).map(|(v, _)| v.clone()))
        }

        async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
            self.available()?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<bool, DomainError> {
            self.available()?;
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.available()?;
            self.entries.lock().unwrap().clear();
            Ok(())
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.available()?;
            Ok(self.entries.lock().unwrap().len())
        }
    }
}
