//! Shared API types

pub mod error;
pub mod json;

pub use error::{ApiError, ApiErrorDetails, ApiErrorResponse};
pub use json::Json;
