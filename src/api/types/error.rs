//! Error envelope returned by every endpoint

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::{ClassifiedError, DomainError, ErrorCategory, ErrorClassifier};

/// Error body: fixed user-facing message plus the category tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub message: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ApiErrorDetails>,
}

/// Diagnostic hints; only present when detail exposure is enabled, or for
/// request validation problems the caller can fix
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
    pub retry_after_secs: Option<u64>,
}

impl ApiError {
    /// Builds the envelope for a classified failure. The technical message
    /// is never included.
    pub fn from_classified(err: &ClassifiedError, expose_details: bool) -> Self {
        let status =
            StatusCode::from_u16(err.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let details = expose_details.then(|| ApiErrorDetails {
            category: Some(err.category.as_str().to_string()),
            retry_after_secs: err.retry_after_secs,
            reason: None,
        });

        Self {
            status,
            response: ApiErrorResponse {
                message: err.user_message.clone(),
                error: err.category.as_str().to_string(),
                details,
            },
            retry_after_secs: err.retry_after_secs,
        }
    }

    pub fn from_domain(err: &DomainError, expose_details: bool) -> Self {
        Self::from_classified(&ErrorClassifier.classify(err), expose_details)
    }

    /// Request validation failure; `reason` describes what the caller
    /// must change
    pub fn bad_request(reason: impl Into<String>) -> Self {
        let classified = ClassifiedError::new(ErrorCategory::Validation, "");
        let mut err = Self::from_classified(&classified, false);
        err.response.details = Some(ApiErrorDetails {
            reason: Some(reason.into()),
            ..Default::default()
        });
        err
    }

    /// Local throttling rejection
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        let classified = ClassifiedError::new(ErrorCategory::RateLimit, "local rate limit")
            .with_retry_after(Some(retry_after_secs));
        Self::from_classified(&classified, false)
    }

    pub fn internal() -> Self {
        Self::from_classified(&ClassifiedError::new(ErrorCategory::Unknown, ""), false)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(secs) = self.retry_after_secs {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

impl From<ClassifiedError> for ApiError {
    fn from(err: ClassifiedError) -> Self {
        Self::from_classified(&err, false)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.error, self.response.message)
    }
}

impl std::error::Error for ApiError {}
