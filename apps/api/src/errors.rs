use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Remote-call failures are converted here, at the action boundary, into
/// user-visible responses. A failed stage action never touches previously
/// stored results, and a cache miss never moves the session out of its
/// current stage.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Cache creation failed: {0}")]
    CacheCreate(String),

    #[error("Cached context expired")]
    CacheExpired,

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg.clone()),
            AppError::CacheCreate(msg) => {
                tracing::error!("Cache creation failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "CACHE_CREATE_ERROR",
                    "Could not create the model context cache. Retry the action once, or restart the analysis.".to_string(),
                )
            }
            AppError::CacheExpired => (
                StatusCode::GONE,
                "CACHE_EXPIRED",
                "The cached analysis context has expired on the model side. Please restart the analysis.".to_string(),
            ),
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_ERROR",
                    "An AI processing error occurred. The previous results are unchanged; retry the action once.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
