//! Chat endpoint handler

use std::borrow::Cow;

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{ChatMode, ChatRequest, ImagePayload};

/// Body of `POST /api/ai/chat`
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_message_or_image"))]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub mode: ChatMode,
    /// `data:image/...;base64,` URL
    #[serde(default)]
    pub image: Option<String>,
}

impl ChatBody {
    fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.trim().is_empty())
    }
}

fn validate_message_or_image(body: &ChatBody) -> Result<(), ValidationError> {
    if body.message.trim().is_empty() && body.image().is_none() {
        return Err(ValidationError::new("message_or_image").with_message(Cow::Borrowed(
            "message must not be empty unless an image is attached",
        )));
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// POST /api/ai/chat
///
/// The orchestration runs on its own task holding a cancellation token;
/// if the client disconnects the handler future is dropped, the guard
/// fires, and in-flight provider calls are abandoned.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, ApiError> {
    body.validate()
        .map_err(|errors| ApiError::bad_request(validation_reason(&errors)))?;

    let chars = body.message.chars().count() as u64;
    if chars > state.limits.max_message_chars {
        return Err(ApiError::bad_request(format!(
            "message exceeds {} characters",
            state.limits.max_message_chars
        )));
    }

    let mut request = ChatRequest::new(body.message.clone(), body.mode);

    if let Some(image) = body.image() {
        let payload = ImagePayload::from_data_url(image, state.limits.max_image_bytes)
            .map_err(|e| {
                debug!(error = %e, "Rejected image attachment");
                ApiError::bad_request("image must be a base64 data URL within the size limit")
            })?;
        request = request.with_image(payload);
    }

    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    let orchestrator = state.orchestrator.clone();

    let handle = tokio::spawn(async move { orchestrator.process(request, cancel).await });

    let result = handle.await.map_err(|e| {
        error!(error = %e, "Orchestration task failed");
        ApiError::internal()
    })?;
    guard.disarm();

    let response =
        result.map_err(|e| ApiError::from_classified(&e, state.expose_error_details))?;

    Ok(Json(ChatResponse {
        content: response.content,
    }))
}

fn validation_reason(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(message: &str, image: Option<&str>) -> ChatBody {
        ChatBody {
            message: message.to_string(),
            mode: ChatMode::DeepSearch,
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_blank_message_without_image_is_invalid() {
        let errors = body("   ", None).validate().unwrap_err();
        assert_eq!(
            validation_reason(&errors),
            "message must not be empty unless an image is attached"
        );

        assert!(body("  ", Some("  ")).validate().is_err());
    }

    #[test]
    fn test_image_alone_is_valid() {
        assert!(body("", Some("data:image/png;base64,AAAA")).validate().is_ok());
        assert!(body("HP 305", None).validate().is_ok());
    }

    #[test]
    fn test_mode_defaults_to_deep_search() {
        let body: ChatBody = serde_json::from_str(r#"{"message":"blekk"}"#).unwrap();
        assert_eq!(body.mode, ChatMode::DeepSearch);

        let body: ChatBody =
            serde_json::from_str(r#"{"message":"blekk","mode":"Think"}"#).unwrap();
        assert_eq!(body.mode, ChatMode::Think);
    }
}
