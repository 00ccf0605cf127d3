use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::extract::ExtractError;
use crate::llm::UpstreamError;
use crate::rate_limit::RateLimitStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("rate limit exceeded")]
    RateLimited(RateLimitStatus),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("could not parse model reply: {source}")]
    Parse {
        source: ExtractError,
        raw_preview: Option<String>,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Server configuration error" })),
                )
                    .into_response()
            }
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::RateLimited(info) => {
                let body = Json(json!({
                    "error": "Rate limit exceeded",
                    "rateLimitInfo": info,
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                let headers = response.headers_mut();
                headers.insert("X-RateLimit-Limit", HeaderValue::from(info.limit));
                headers.insert("X-RateLimit-Remaining", HeaderValue::from(info.remaining));
                headers.insert("X-RateLimit-Reset", HeaderValue::from(info.reset));
                response
            }
            AppError::Upstream(err) => {
                tracing::error!("Upstream error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.user_message(), "details": err.to_string() })),
                )
                    .into_response()
            }
            AppError::Parse {
                source,
                raw_preview,
            } => {
                tracing::error!("Parse error: {}", source);
                let mut body = json!({
                    "error": "Error parsing analysis results. Please try again.",
                    "details": source.to_string(),
                });
                if let Some(preview) = raw_preview {
                    body["rawText"] = json!(preview);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::Document(err) => {
                tracing::warn!("Document error: {}", err);
                let status = match err {
                    DocumentError::Unsupported(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    DocumentError::Unreadable(_) | DocumentError::Empty => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (
                    status,
                    Json(json!({ "error": "Error processing file", "details": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
