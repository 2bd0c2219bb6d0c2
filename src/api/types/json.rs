//! JSON extractor whose rejections use the API error envelope

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Wrapper around `axum::Json` so malformed bodies produce the same
/// envelope as any other validation failure
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Body rejection rendered as a validation error; 400 unless the body
/// exceeded the size limit
#[derive(Debug)]
pub struct JsonRejection {
    status: StatusCode,
    reason: String,
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        let mut err = ApiError::bad_request(self.reason);
        err.status = self.status;
        err.into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected request body");

                let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };

                Err(JsonRejection {
                    status,
                    reason: rejection_reason(&rejection).to_string(),
                })
            }
        }
    }
}

/// Short reason without serde internals
fn rejection_reason(rejection: &axum::extract::rejection::JsonRejection) -> &'static str {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(_) => "Request body has missing or invalid fields",
        JsonSyntaxError(_) => "Request body is not valid JSON",
        MissingJsonContentType(_) => "Expected 'Content-Type: application/json'",
        BytesRejection(_) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            "Request body is too large"
        }
        BytesRejection(_) => "Failed to read request body",
        _ => "Invalid JSON request",
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_is_validation_envelope() {
        let rejection = JsonRejection {
            status: StatusCode::BAD_REQUEST,
            reason: "Request body is not valid JSON".to_string(),
        };

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_oversized_rejection_keeps_413() {
        let rejection = JsonRejection {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            reason: "Request body is too large".to_string(),
        };

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_json_deref() {
        let json = Json("hello".to_string());
        assert_eq!(*json, "hello");
        assert_eq!(json.into_inner(), "hello");
    }
}
