//! Content-addressed cache key derivation

use sha2::{Digest, Sha256};

/// Marker used in place of an absent image hash
const NO_IMAGE: &str = "-";

/// Inputs identifying a cacheable unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyParams {
    query: String,
    mode: String,
    image_hash: Option<String>,
}

impl CacheKeyParams {
    /// Creates key parameters for a query; the query is normalized
    pub fn new(query: &str) -> Self {
        Self {
            query: normalize_query(query),
            mode: String::new(),
            image_hash: None,
        }
    }

    /// Sets the mode tag (e.g. `deepsearch`, `reasoning`)
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into().to_lowercase();
        self
    }

    /// Sets the image fingerprint, if any
    pub fn with_image_hash(mut self, hash: Option<&str>) -> Self {
        self.image_hash = hash.map(|h| h.to_lowercase());
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Derives the key under `namespace`.
    ///
    /// The query goes last so the fixed-charset mode and hash segments keep
    /// the encoding unambiguous. Keys longer than `max_len` collapse to a
    /// SHA-256 of the full tuple.
    pub fn derive(&self, namespace: &str, max_len: usize) -> String {
        let image = self.image_hash.as_deref().unwrap_or(NO_IMAGE);
        let key = format!("{}:{}:{}:{}", namespace, self.mode, image, self.query);

        if key.len() <= max_len {
            return key;
        }

        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.mode.as_bytes());
        hasher.update([0u8]);
        hasher.update(image.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.query.as_bytes());

        format!("{}:h:{}", namespace, hex::encode(hasher.finalize()))
    }
}

/// Trims, lowercases and collapses internal whitespace
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
