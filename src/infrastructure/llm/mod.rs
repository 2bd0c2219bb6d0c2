//! Backend provider implementations

mod chat_completions;
mod factory;
mod http_client;
mod resilient;
mod vision;

pub use chat_completions::ChatCompletionsProvider;
pub use factory::{
    ProviderFactory, ProviderSet, ProviderSettings, ProviderStatus, ProvidersConfig,
    UnconfiguredProvider,
};
pub use http_client::{HttpClient, HttpClientTrait};
pub use resilient::{ResilientProvider, RetryPolicy};
pub use vision::VisionProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
