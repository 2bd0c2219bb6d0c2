use serde::Deserialize;

use crate::domain::ClassifierConfig;
use crate::infrastructure::analytics::AnalyticsConfig;
use crate::infrastructure::cache::ResultCacheConfig;
use crate::infrastructure::llm::ProvidersConfig;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::orchestrator::PromptConfig;
use crate::infrastructure::rate_limit::RateLimitConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
    pub cache: ResultCacheConfig,
    pub classifier: ClassifierConfig,
    pub providers: ProvidersConfig,
    pub rate_limit: RateLimitConfig,
    pub analytics: AnalyticsConfig,
    pub prompts: PromptConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Adds category and retry hints to error envelopes; never raw
    /// provider text
    pub expose_error_details: bool,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            expose_error_details: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Request size limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_message_chars: u64,
    pub max_image_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 4000,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl LimitsConfig {
    /// Largest accepted chat request body: a base64 image at the size
    /// limit, a fully escaped message and room for the JSON envelope
    pub fn max_body_bytes(&self) -> usize {
        let image = self.max_image_bytes.div_ceil(3) * 4;
        let message = usize::try_from(self.max_message_chars)
            .unwrap_or(usize::MAX)
            .saturating_mul(6);
        image.saturating_add(message).saturating_add(64 * 1024)
    }
}

impl AppConfig {
    /// Loads `config/default`, then `config/local`, then `APP__*`
    /// environment variables (e.g. `APP__PROVIDERS__SEARCH__API_KEY`)
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
