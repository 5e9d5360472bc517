//! Mapping from crate errors to HTTP responses
//!
//! Every failure renders as a JSON `{error, message}` body; the status
//! code follows the failure class.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::{Error, StoreError};
use crate::models::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// No `x-user-id` header (401)
    Unauthorized,

    /// Viewer has not completed onboarding (403)
    OnboardingRequired,

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Store unreachable or unconfigured (503, logged)
    Unavailable(StoreError),

    /// Read or write failure (500, logged)
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            Self::Validation(e) => (StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "sign in required".to_owned(),
            ),
            Self::OnboardingRequired => (
                StatusCode::FORBIDDEN,
                "onboarding_required",
                "complete your profile first".to_owned(),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("{} '{}' not found", resource, id),
            ),
            Self::Unavailable(e) => {
                tracing::error!("Store unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "the data store is unavailable".to_owned(),
                )
            }
            Self::Store(e) => {
                tracing::error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { resource, id } => Self::NotFound { resource, id },
            e if e.is_connectivity() => Self::Unavailable(e),
            e => Self::Store(e),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Validation(e) => e.into(),
            Error::Store(e) => e.into(),
        }
    }
}
