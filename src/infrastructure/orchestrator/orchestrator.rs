//! Strategy execution over cache and providers

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::prompts::PromptConfig;
use crate::domain::{
    AnalyticsEvent, CacheKeyParams, ChatRequest, ClassifiedError, DomainError, ErrorCategory,
    ErrorClassifier, ErrorEvent, EventSink, ProviderInput, ProviderRole, QueryClassification,
    QueryClassifier, SearchEvent, Strategy,
};
use crate::infrastructure::cache::{CachePool, ResultCache};
use crate::infrastructure::llm::ProviderSet;
use crate::infrastructure::observability::record_query;

/// Answer to one chat request
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorResponse {
    pub content: String,
    pub classification: QueryClassification,
    pub strategy: Strategy,
    pub cache_hit: bool,
    pub model_used: String,
    /// A non-fatal sub-step (image analysis) failed
    pub degraded: bool,
}

struct Execution {
    content: String,
    cache_hit: bool,
    degraded: bool,
}

impl Execution {
    fn hit(content: String) -> Self {
        Self {
            content,
            cache_hit: true,
            degraded: false,
        }
    }

    fn fresh(content: String, degraded: bool) -> Self {
        Self {
            content,
            cache_hit: false,
            degraded,
        }
    }
}

/// Provider whose answer is returned for each strategy
fn answering_role(strategy: Strategy) -> ProviderRole {
    match strategy {
        Strategy::SearchOnly => ProviderRole::Search,
        Strategy::ReasoningOnly | Strategy::SearchThenReason => ProviderRole::Reasoning,
        Strategy::UnifiedReasoning => ProviderRole::Unified,
    }
}

/// Classifies a request, runs its strategy and records exactly one search
/// event per completed request.
pub struct QueryOrchestrator {
    classifier: QueryClassifier,
    providers: ProviderSet,
    cache: Arc<ResultCache>,
    events: Arc<dyn EventSink>,
    prompts: PromptConfig,
}

impl QueryOrchestrator {
    pub fn new(
        classifier: QueryClassifier,
        providers: ProviderSet,
        cache: Arc<ResultCache>,
        events: Arc<dyn EventSink>,
        prompts: PromptConfig,
    ) -> Self {
        Self {
            classifier,
            providers,
            cache,
            events,
            prompts,
        }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Answers `request`.
    ///
    /// Provider calls race `cancel`; a cancelled request writes no cache
    /// entry and records no events.
    pub async fn process(
        &self,
        request: ChatRequest,
        cancel: CancellationToken,
    ) -> Result<OrchestratorResponse, ClassifiedError> {
        if request.message.trim().is_empty() && !request.has_image() {
            return Err(ErrorClassifier.classify(&DomainError::validation(
                "Message must not be empty unless an image is attached",
            )));
        }

        let request_id = Uuid::new_v4();
        let start = Instant::now();
        let classification = self
            .classifier
            .classify(&request.message, request.has_image());
        let strategy = classification.strategy.for_mode(request.mode);
        let model_used = self.providers.get(answering_role(strategy)).model().to_string();

        let span = info_span!(
            "orchestrate",
            %request_id,
            %strategy,
            query_type = %classification.query_type,
            mode = %request.mode
        );

        let result = self
            .execute(strategy, &request, &classification, &cancel)
            .instrument(span)
            .await;
        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        match result {
            Ok(execution) => {
                info!(
                    %request_id,
                    %strategy,
                    cache_hit = execution.cache_hit,
                    degraded = execution.degraded,
                    duration_ms,
                    "Query answered"
                );
                record_query(strategy.as_str(), true, execution.cache_hit, elapsed);

                self.events.record(AnalyticsEvent::Search(SearchEvent {
                    id: request_id,
                    timestamp: Utc::now(),
                    query: request.message.clone(),
                    mode: request.mode,
                    has_image: request.has_image(),
                    classification: classification.clone(),
                    strategy,
                    response_time_ms: duration_ms,
                    success: true,
                    cache_hit: execution.cache_hit,
                    model_used: model_used.clone(),
                    response_length: execution.content.chars().count(),
                    degraded: execution.degraded,
                    error_category: None,
                }));

                Ok(OrchestratorResponse {
                    content: execution.content,
                    classification,
                    strategy,
                    cache_hit: execution.cache_hit,
                    model_used,
                    degraded: execution.degraded,
                })
            }
            Err(error) if error.is_cancelled() => {
                info!(%request_id, %strategy, duration_ms, "Request cancelled by caller");
                Err(ClassifiedError::new(ErrorCategory::Unknown, error.to_string()))
            }
            Err(error) => {
                let classified = ErrorClassifier.classify(&error);
                warn!(
                    %request_id,
                    %strategy,
                    category = %classified.category,
                    duration_ms,
                    error = %classified.technical_message,
                    "Query failed"
                );
                record_query(strategy.as_str(), false, false, elapsed);

                self.events.record(AnalyticsEvent::Search(SearchEvent {
                    id: request_id,
                    timestamp: Utc::now(),
                    query: request.message.clone(),
                    mode: request.mode,
                    has_image: request.has_image(),
                    classification,
                    strategy,
                    response_time_ms: duration_ms,
                    success: false,
                    cache_hit: false,
                    model_used,
                    response_length: 0,
                    degraded: false,
                    error_category: Some(classified.category),
                }));
                self.events.record(AnalyticsEvent::Error(ErrorEvent::new(
                    request.message,
                    request.mode,
                    &classified,
                    error.provider_name().map(str::to_string),
                )));

                Err(classified)
            }
        }
    }

    async fn execute(
        &self,
        strategy: Strategy,
        request: &ChatRequest,
        classification: &QueryClassification,
        cancel: &CancellationToken,
    ) -> Result<Execution, DomainError> {
        let mode = request.mode;

        match strategy {
            Strategy::SearchOnly => {
                let key = self.cache.key(
                    CachePool::Search,
                    &CacheKeyParams::new(&request.message).with_mode(mode.as_str()),
                );
                if let Some(content) = self.cache.get(CachePool::Search, &key).await {
                    return Ok(Execution::hit(content));
                }

                let input = ProviderInput::new(self.prompts.question(&request.message))
                    .with_system(&self.prompts.search_system);
                let content = self.call(ProviderRole::Search, input, cancel).await?;

                self.store(CachePool::Search, &key, &content, cancel).await;
                Ok(Execution::fresh(content, false))
            }
            Strategy::ReasoningOnly => {
                // The system prompt depends on the mode, so the key does too
                let key = self.reasoning_key(request, &format!("reasoning:{}", mode.as_str()));
                if let Some(content) = self.cache.get(CachePool::Reasoning, &key).await {
                    return Ok(Execution::hit(content));
                }

                let (analysis, degraded) =
                    self.analyze_image(request, classification, cancel).await?;
                let input = ProviderInput::new(
                    self.prompts
                        .with_image_context(&request.message, analysis.as_deref()),
                )
                .with_system(self.prompts.reasoning_system_for(mode));
                let content = self.call(ProviderRole::Reasoning, input, cancel).await?;

                if !degraded {
                    self.store(CachePool::Reasoning, &key, &content, cancel).await;
                }
                Ok(Execution::fresh(content, degraded))
            }
            Strategy::SearchThenReason => {
                let key =
                    self.reasoning_key(request, &format!("search-then-reason:{}", mode.as_str()));
                if let Some(content) = self.cache.get(CachePool::Reasoning, &key).await {
                    return Ok(Execution::hit(content));
                }

                let (analysis, degraded) =
                    self.analyze_image(request, classification, cancel).await?;
                let search_context = if degraded { None } else { analysis.as_deref() };
                let search_input = ProviderInput::new(
                    self.prompts.with_image_context(&request.message, search_context),
                )
                .with_system(&self.prompts.search_system);
                let results = self.call(ProviderRole::Search, search_input, cancel).await?;

                let input = ProviderInput::new(self.prompts.with_search_results(
                    &request.message,
                    &results,
                    analysis.as_deref(),
                ))
                .with_system(self.prompts.reasoning_system_for(mode));
                let content = self.call(ProviderRole::Reasoning, input, cancel).await?;

                if !degraded {
                    self.store(CachePool::Reasoning, &key, &content, cancel).await;
                }
                Ok(Execution::fresh(content, degraded))
            }
            Strategy::UnifiedReasoning => {
                let key = self.reasoning_key(request, mode.as_str());
                if let Some(content) = self.cache.get(CachePool::Reasoning, &key).await {
                    return Ok(Execution::hit(content));
                }

                let (analysis, degraded) =
                    self.analyze_image(request, classification, cancel).await?;
                let input = ProviderInput::new(
                    self.prompts
                        .with_image_context(&request.message, analysis.as_deref()),
                )
                .with_system(&self.prompts.unified_system);
                let content = self.call(ProviderRole::Unified, input, cancel).await?;

                if !degraded {
                    self.store(CachePool::Reasoning, &key, &content, cancel).await;
                }
                Ok(Execution::fresh(content, degraded))
            }
        }
    }

    fn reasoning_key(&self, request: &ChatRequest, mode_tag: &str) -> String {
        self.cache.key(
            CachePool::Reasoning,
            &CacheKeyParams::new(&request.message)
                .with_mode(mode_tag)
                .with_image_hash(request.image_hash()),
        )
    }

    /// Runs image analysis when the query needs the attached image.
    ///
    /// Returns the analysis text and whether it is the fallback placeholder.
    /// Only cancellation propagates; every other failure degrades.
    async fn analyze_image(
        &self,
        request: &ChatRequest,
        classification: &QueryClassification,
        cancel: &CancellationToken,
    ) -> Result<(Option<String>, bool), DomainError> {
        let Some(image) = request
            .image
            .as_ref()
            .filter(|_| classification.requires_image)
        else {
            return Ok((None, false));
        };

        let input = ProviderInput::new(&self.prompts.vision_instruction).with_image(image.clone());

        match self.call(ProviderRole::Vision, input, cancel).await {
            Ok(analysis) => Ok((Some(analysis), false)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                warn!(error = %e, "Image analysis failed, continuing with placeholder");
                Ok((Some(self.prompts.image_fallback.clone()), true))
            }
        }
    }

    async fn call(
        &self,
        role: ProviderRole,
        input: ProviderInput,
        cancel: &CancellationToken,
    ) -> Result<String, DomainError> {
        let provider = self.providers.get(role);
        debug!(%role, provider = provider.name(), "Calling provider");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DomainError::cancelled(format!("{} call abandoned", role))),
            result = provider.call(input) => result,
        }
    }

    async fn store(&self, pool: CachePool, key: &str, content: &str, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            debug!(pool = pool.as_str(), "Request cancelled, skipping cache write");
            return;
        }

        self.cache.set(pool, key, content).await;
    }
}
