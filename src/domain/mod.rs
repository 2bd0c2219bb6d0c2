//! Domain layer - Core business logic and entities

pub mod analytics;
pub mod cache;
pub mod chat;
pub mod classification;
pub mod error;
pub mod error_classification;
pub mod provider;

pub use analytics::{AnalyticsEvent, ErrorEvent, EventSink, SearchEvent};
pub use cache::{Cache, CacheKeyParams, Clock, SystemClock};
pub use chat::{ChatMode, ChatRequest, ImagePayload};
pub use classification::{
    ClassifierConfig, QueryClassification, QueryClassifier, QueryType, Strategy,
};
pub use error::DomainError;
pub use error_classification::{ClassifiedError, ErrorCategory, ErrorClassifier};
pub use provider::{Provider, ProviderInput, ProviderRole};
