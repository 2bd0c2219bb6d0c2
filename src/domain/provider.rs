//! Provider abstraction - one input, one text answer

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use super::DomainError;
use super::chat::ImagePayload;

/// Role a provider plays in the orchestration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    /// Web/product search
    Search,
    /// Pure reasoning over supplied context
    Reasoning,
    /// Combined search and reasoning in one call
    Unified,
    /// Image analysis
    Vision,
}

impl ProviderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Reasoning => "reasoning",
            Self::Unified => "unified",
            Self::Vision => "vision",
        }
    }
}

impl std::fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input to a single provider call
#[derive(Debug, Clone, Default)]
pub struct ProviderInput {
    pub prompt: String,
    pub system: Option<String>,
    pub image: Option<ImagePayload>,
}

impl ProviderInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            image: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_image(mut self, image: ImagePayload) -> Self {
        self.image = Some(image);
        self
    }
}

/// An external search, reasoning or vision capability
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Performs one call and returns the provider's text answer
    async fn call(&self, input: ProviderInput) -> Result<String, DomainError>;

    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    /// Model identifier reported in analytics
    fn model(&self) -> &str;
}
