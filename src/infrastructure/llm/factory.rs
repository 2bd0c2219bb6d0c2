use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::chat_completions::ChatCompletionsProvider;
use super::http_client::HttpClient;
use super::resilient::{ResilientProvider, RetryPolicy};
use super::vision::VisionProvider;
use crate::domain::{DomainError, Provider, ProviderInput, ProviderRole};

/// Connection settings for one backend
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    #[serde(default = "default_path")]
    pub path: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_path() -> String {
    "/chat/completions".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backoff_ms() -> u64 {
    250
}

impl ProviderSettings {
    fn new(base_url: &str, path: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.to_string(),
            path: path.to_string(),
            model: model.to_string(),
            api_key: None,
            timeout_secs,
            max_retries: 0,
            backoff_ms: default_backoff_ms(),
        }
    }

    /// API key, if set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_initial_delay(self.backoff_ms)
    }
}

/// Settings for the four backend roles
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub search: ProviderSettings,
    pub reasoning: ProviderSettings,
    pub unified: ProviderSettings,
    pub vision: ProviderSettings,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            search: ProviderSettings::new("https://api.perplexity.ai", "/chat/completions", "sonar", 30),
            reasoning: ProviderSettings::new("https://api.openai.com", "/v1/chat/completions", "gpt-4o-mini", 60),
            unified: ProviderSettings::new(
                "https://api.perplexity.ai",
                "/chat/completions",
                "sonar-reasoning-pro",
                90,
            ),
            vision: ProviderSettings::new("https://api.openai.com", "/v1/chat/completions", "gpt-4o", 30),
        }
    }
}

impl ProvidersConfig {
    pub fn settings(&self, role: ProviderRole) -> &ProviderSettings {
        match role {
            ProviderRole::Search => &self.search,
            ProviderRole::Reasoning => &self.reasoning,
            ProviderRole::Unified => &self.unified,
            ProviderRole::Vision => &self.vision,
        }
    }
}

/// Which backends have credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    pub search: bool,
    pub reasoning: bool,
    pub unified: bool,
    pub vision: bool,
}

/// The providers an orchestrator dispatches to, one per role
#[derive(Debug, Clone)]
pub struct ProviderSet {
    pub search: Arc<dyn Provider>,
    pub reasoning: Arc<dyn Provider>,
    pub unified: Arc<dyn Provider>,
    pub vision: Arc<dyn Provider>,
    pub status: ProviderStatus,
}

impl ProviderSet {
    pub fn get(&self, role: ProviderRole) -> &Arc<dyn Provider> {
        match role {
            ProviderRole::Search => &self.search,
            ProviderRole::Reasoning => &self.reasoning,
            ProviderRole::Unified => &self.unified,
            ProviderRole::Vision => &self.vision,
        }
    }
}

/// Stand-in for a backend without credentials; every call fails as an
/// authentication error
#[derive(Debug)]
pub struct UnconfiguredProvider {
    name: String,
    model: String,
}

impl UnconfiguredProvider {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Provider for UnconfiguredProvider {
    async fn call(&self, _input: ProviderInput) -> Result<String, DomainError> {
        Err(DomainError::authentication(
            &self.name,
            "API key not configured",
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Factory for creating backend providers
#[derive(Debug)]
pub struct ProviderFactory;

impl ProviderFactory {
    /// Builds every role from configuration.
    ///
    /// Roles without an API key get an `UnconfiguredProvider` so the
    /// service still starts and reports the gap through health and 401s.
    pub fn create_set(
        config: &ProvidersConfig,
        max_image_bytes: usize,
    ) -> Result<ProviderSet, DomainError> {
        let build = |role: ProviderRole| Self::create(role, config.settings(role), max_image_bytes);

        Ok(ProviderSet {
            search: build(ProviderRole::Search)?,
            reasoning: build(ProviderRole::Reasoning)?,
            unified: build(ProviderRole::Unified)?,
            vision: build(ProviderRole::Vision)?,
            status: ProviderStatus {
                search: config.search.api_key().is_some(),
                reasoning: config.reasoning.api_key().is_some(),
                unified: config.unified.api_key().is_some(),
                vision: config.vision.api_key().is_some(),
            },
        })
    }

    /// Builds one role: chat-completions adapter, vision validation for the
    /// vision role, then timeout and retry
    pub fn create(
        role: ProviderRole,
        settings: &ProviderSettings,
        max_image_bytes: usize,
    ) -> Result<Arc<dyn Provider>, DomainError> {
        let Some(api_key) = settings.api_key() else {
            tracing::warn!(role = %role, "No API key configured, provider disabled");
            return Ok(Arc::new(UnconfiguredProvider::new(role.as_str(), &settings.model)));
        };

        let client = HttpClient::new(settings.timeout())?;
        let adapter: Arc<dyn Provider> = Arc::new(ChatCompletionsProvider::new(
            client,
            role.as_str(),
            &settings.base_url,
            &settings.path,
            &settings.model,
            api_key,
        ));

        let adapter = match role {
            ProviderRole::Vision => Arc::new(VisionProvider::new(adapter, max_image_bytes)),
            _ => adapter,
        };

        Ok(Arc::new(ResilientProvider::new(
            adapter,
            role,
            settings.timeout(),
            settings.retry_policy(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_yields_auth_failure() {
        let set = ProviderFactory::create_set(&ProvidersConfig::default(), 1024).unwrap();

        assert_eq!(set.status, ProviderStatus::default());

        let err = set.search.call(ProviderInput::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::Authentication { .. }));
        assert_eq!(set.search.model(), "sonar");
    }

    #[test]
    fn test_configured_roles_are_reported() {
        let mut config = ProvidersConfig::default();
        config.search.api_key = Some("pplx-key".to_string());
        config.vision.api_key = Some("   ".to_string());

        let set = ProviderFactory::create_set(&config, 1024).unwrap();

        assert!(set.status.search);
        assert!(!set.status.vision);
        assert_eq!(set.get(ProviderRole::Search).name(), "search");
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: ProviderSettings = serde_json::from_value(serde_json::json!({
            "base_url": "http://localhost:8080",
            "model": "local",
            "max_retries": 2
        }))
        .unwrap();

        assert_eq!(settings.path, "/chat/completions");
        assert_eq!(settings.timeout(), Duration::from_secs(30));
        assert_eq!(settings.retry_policy().max_retries, 2);
        assert!(settings.api_key().is_none());
    }
}
