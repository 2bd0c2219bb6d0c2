//! Chat request model - query text, processing mode and optional image

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::DomainError;

static DATA_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:(image/(?:png|jpeg|jpg|gif|webp));base64,([A-Za-z0-9+/=\s]+)$")
        .expect("data URL pattern is valid")
});

/// Processing mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChatMode {
    #[default]
    DeepSearch,
    Think,
}

impl ChatMode {
    /// Stable tag used in cache keys and analytics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepSearch => "deepsearch",
            Self::Think => "think",
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeepSearch => write!(f, "DeepSearch"),
            Self::Think => write!(f, "Think"),
        }
    }
}

/// A validated base64 image attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    media_type: String,
    data_url: String,
    content_hash: String,
    size_bytes: usize,
}

impl ImagePayload {
    /// Parses and validates a `data:image/...;base64,` URL.
    ///
    /// Rejects non-image media types, malformed base64 and images larger
    /// than `max_bytes` once decoded.
    pub fn from_data_url(data_url: &str, max_bytes: usize) -> Result<Self, DomainError> {
        let data_url = data_url.trim();
        let captures = DATA_URL_PATTERN.captures(data_url).ok_or_else(|| {
            DomainError::validation("Image must be a base64 data URL (png, jpeg, gif or webp)")
        })?;

        let media_type = captures[1].to_string();
        let payload: String = captures[2].chars().filter(|c| !c.is_whitespace()).collect();

        let decoded = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| DomainError::validation(format!("Image is not valid base64: {}", e)))?;

        if decoded.is_empty() {
            return Err(DomainError::validation("Image payload is empty"));
        }

        if decoded.len() > max_bytes {
            return Err(DomainError::validation(format!(
                "Image is too large ({} bytes, max {} bytes)",
                decoded.len(),
                max_bytes
            )));
        }

        let content_hash = hex::encode(Sha256::digest(&decoded));

        Ok(Self {
            media_type,
            data_url: data_url.to_string(),
            content_hash,
            size_bytes: decoded.len(),
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// SHA-256 of the decoded image bytes, hex encoded
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

/// A validated chat request as seen by the orchestrator
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    pub mode: ChatMode,
    pub image: Option<ImagePayload>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            message: message.into(),
            mode,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn image_hash(&self) -> Option<&str> {
        self.image.as_ref().map(|i| i.content_hash())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// 1x1 transparent PNG
    pub const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";
}
