//! Per-client throttling for the chat routes

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;

const ANONYMOUS_CLIENT: &str = "anonymous";

/// Rejects with 429 and `Retry-After` once a client exceeds its window
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_id(request.headers());
    let result = state.rate_limiter.check_and_record(&client).await;

    if !result.allowed {
        warn!(
            client = %client,
            limit = result.limit,
            reset_in_seconds = result.reset_in_seconds,
            "Rate limit exceeded"
        );
        return ApiError::rate_limited(result.reset_in_seconds.max(1)).into_response();
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(result.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(result.remaining));

    response
}

/// First forwarded address, then the real-ip header, then a shared bucket
fn client_id(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(ANONYMOUS_CLIENT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_client_id_prefers_first_forwarded_address() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "10.0.0.2"),
        ]);
        assert_eq!(client_id(&map), "203.0.113.7");
    }

    #[test]
    fn test_client_id_falls_back() {
        assert_eq!(client_id(&headers(&[("x-real-ip", "10.0.0.2")])), "10.0.0.2");
        assert_eq!(client_id(&headers(&[("x-forwarded-for", " ")])), "anonymous");
        assert_eq!(client_id(&HeaderMap::new()), "anonymous");
    }
}
