use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::DomainError;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    /// POSTs `body` and returns the decoded JSON response.
    ///
    /// Non-2xx statuses and transport failures map to typed `DomainError`
    /// variants attributed to `provider`.
    async fn post_json(
        &self,
        provider: &str,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Real HTTP client using reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn map_send_error(&self, provider: &str, error: reqwest::Error) -> DomainError {
        if error.is_timeout() {
            DomainError::timeout(provider, self.timeout.as_millis() as u64)
        } else if error.is_connect() {
            DomainError::unavailable(provider, format!("connection refused: {}", error))
        } else {
            DomainError::provider(provider, format!("Request failed: {}", error))
        }
    }
}

/// Maps a non-success status to the matching error variant
fn status_error(
    provider: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: String,
    timeout: Duration,
) -> DomainError {
    let message = format!("HTTP {}: {}", status.as_u16(), body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            DomainError::authentication(provider, message)
        }
        StatusCode::TOO_MANY_REQUESTS => {
            DomainError::rate_limited(provider, message, retry_after_secs)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            DomainError::unavailable(provider, message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DomainError::timeout(provider, timeout.as_millis() as u64)
        }
        _ => DomainError::provider(provider, message),
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        provider: &str,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(provider, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            let error_body = response.text().await.unwrap_or_default();

            return Err(status_error(
                provider,
                status,
                retry_after,
                error_body,
                self.timeout,
            ));
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                DomainError::timeout(provider, self.timeout.as_millis() as u64)
            } else {
                DomainError::provider(provider, format!("Failed to parse response: {}", e))
            }
        })
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// Recorded `(url, body)` pairs
    pub type RequestLog = Arc<RwLock<Vec<(String, serde_json::Value)>>>;

    #[derive(Debug, Default)]
    pub struct MockHttpClient {
        responses: RwLock<HashMap<String, serde_json::Value>>,
        errors: RwLock<HashMap<String, String>>,
        requests: RequestLog,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(self, url: impl Into<String>, response: serde_json::Value) -> Self {
            self.responses.write().unwrap().insert(url.into(), response);
            self
        }

        pub fn with_error(self, url: impl Into<String>, error: impl Into<String>) -> Self {
            self.errors.write().unwrap().insert(url.into(), error.into());
            self
        }

        pub fn requests(&self) -> RequestLog {
            self.requests.clone()
        }
    }

    #[async_trait]
    impl HttpClientTrait for MockHttpClient {
        async fn post_json(
            &self,
            provider: &str,
            url: &str,
            _headers: Vec<(&str, &str)>,
            body: &serde_json::Value,
        ) -> Result<serde_json::Value, DomainError> {
            self.requests
                .write()
                .unwrap()
                .push((url.to_string(), body.clone()));

            if let Some(error) = self.errors.read().unwrap().get(url) {
                return Err(DomainError::provider(provider, error));
            }

            self.responses
                .read()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| {
                    DomainError::provider(provider, format!("No mock response for {}", url))
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> HttpClient {
        HttpClient::new(Duration::from_millis(300)).unwrap()
    }

    async fn post(server: &MockServer) -> Result<serde_json::Value, DomainError> {
        client()
            .post_json(
                "search",
                &format!("{}/chat", server.uri()),
                vec![("Authorization", "Bearer test")],
                &json!({"q": 1}),
            )
            .await
    }

    async fn respond_with(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_success_returns_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("Authorization", "Bearer test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value = post(&server).await.unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_401_maps_to_authentication() {
        let server = respond_with(ResponseTemplate::new(401).set_body_string("bad key")).await;

        let err = post(&server).await.unwrap_err();
        assert!(matches!(err, DomainError::Authentication { ref provider, .. } if provider == "search"));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_429_carries_retry_after_header() {
        let server = respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_string("slow down"),
        )
        .await;

        let err = post(&server).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::RateLimited {
                retry_after_secs: Some(7),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_503_maps_to_unavailable() {
        let server = respond_with(ResponseTemplate::new(503)).await;

        let err = post(&server).await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_other_status_maps_to_provider_error() {
        let server = respond_with(ResponseTemplate::new(418).set_body_string("teapot")).await;

        let err = post(&server).await.unwrap_err();
        assert!(matches!(err, DomainError::Provider { .. }));
        assert!(err.to_string().contains("HTTP 418: teapot"));
    }

    #[tokio::test]
    async fn test_slow_response_maps_to_timeout() {
        let server = respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .await;

        let err = post(&server).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout { timeout_ms: 300, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_maps_to_unavailable() {
        let err = client()
            .post_json("vision", "http://127.0.0.1:1/chat", vec![], &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Unavailable { .. }));
    }
}
