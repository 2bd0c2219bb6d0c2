//! OpenAI-compatible chat-completions adapter

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::http_client::HttpClientTrait;
use crate::domain::{DomainError, Provider, ProviderInput};

/// Provider speaking the `/chat/completions` wire format.
///
/// Covers search backends that return `citations` alongside the answer as
/// well as plain reasoning and vision models.
#[derive(Debug)]
pub struct ChatCompletionsProvider<C: HttpClientTrait> {
    client: C,
    name: String,
    model: String,
    url: String,
    auth_header: String,
}

impl<C: HttpClientTrait> ChatCompletionsProvider<C> {
    pub fn new(
        client: C,
        name: impl Into<String>,
        base_url: &str,
        path: &str,
        model: impl Into<String>,
        api_key: &str,
    ) -> Self {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        Self {
            client,
            name: name.into(),
            model: model.into(),
            url,
            auth_header: format!("Bearer {}", api_key),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_request(&self, input: &ProviderInput) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = &input.system {
            messages.push(json!({"role": "system", "content": system}));
        }

        let content = match &input.image {
            Some(image) => json!([
                {"type": "text", "text": input.prompt},
                {"type": "image_url", "image_url": {"url": image.data_url()}}
            ]),
            None => json!(input.prompt),
        };
        messages.push(json!({"role": "user", "content": content}));

        json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        })
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: CompletionResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(&self.name, format!("Failed to parse response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| DomainError::provider(&self.name, "Empty response from provider"))?;

        if response.citations.is_empty() {
            return Ok(content);
        }

        let sources = response
            .citations
            .iter()
            .enumerate()
            .map(|(i, url)| format!("[{}] {}", i + 1, url))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!("{}\n\nKilder:\n{}", content, sources))
    }
}

#[async_trait]
impl<C: HttpClientTrait> Provider for ChatCompletionsProvider<C> {
    async fn call(&self, input: ProviderInput) -> Result<String, DomainError> {
        let body = self.build_request(&input);
        let response = self
            .client
            .post_json(&self.name, &self.url, self.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::fixtures::TINY_PNG;
    use crate::domain::ImagePayload;
    use crate::infrastructure::llm::http_client::mock::MockHttpClient;

    const URL: &str = "https://api.example.com/v1/chat/completions";

    fn provider(client: MockHttpClient) -> ChatCompletionsProvider<MockHttpClient> {
        ChatCompletionsProvider::new(
            client,
            "search",
            "https://api.example.com/",
            "/v1/chat/completions",
            "sonar",
            "key",
        )
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn test_url_join() {
        let provider = provider(MockHttpClient::new());
        assert_eq!(provider.url(), URL);
    }

    #[tokio::test]
    async fn test_call_returns_content() {
        let client = MockHttpClient::new().with_response(URL, completion("PG-540 koster 199 kr"));
        let provider = provider(client);

        let answer = provider
            .call(ProviderInput::new("Canon PG-540 pris").with_system("Svar kort"))
            .await
            .unwrap();

        assert_eq!(answer, "PG-540 koster 199 kr");
    }

    #[tokio::test]
    async fn test_request_shape_with_image() {
        let client = MockHttpClient::new().with_response(URL, completion("ok"));
        let requests = client.requests();
        let provider = provider(client);
        let image = ImagePayload::from_data_url(TINY_PNG, 1024).unwrap();

        provider
            .call(ProviderInput::new("Hva er dette?").with_image(image))
            .await
            .unwrap();

        let requests = requests.read().unwrap();
        let body = &requests[0].1;
        assert_eq!(body["model"], "sonar");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["text"], "Hva er dette?");
        assert_eq!(content[1]["type"], "image_url");
        assert!(content[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_citations_are_appended() {
        let client = MockHttpClient::new().with_response(
            URL,
            json!({
                "choices": [{"message": {"content": "Svar"}}],
                "citations": ["https://a.no", "https://b.no"]
            }),
        );

        let answer = provider(client).call(ProviderInput::new("q")).await.unwrap();
        assert_eq!(answer, "Svar\n\nKilder:\n[1] https://a.no\n[2] https://b.no");
    }

    #[tokio::test]
    async fn test_empty_content_is_error() {
        let client = MockHttpClient::new().with_response(URL, completion("  "));

        let err = provider(client).call(ProviderInput::new("q")).await.unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let client = MockHttpClient::new().with_error(URL, "HTTP 401: invalid api key");

        let err = provider(client).call(ProviderInput::new("q")).await.unwrap_err();
        assert_eq!(err.provider_name(), Some("search"));
        assert!(err.to_string().contains("401"));
    }
}
