use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::AppError;
use crate::extract::{reply_preview, truncate_document};
use crate::identity::ClientIdentity;
use crate::metrics::{
    ANALYZE_REQUESTS, PARSE_FAILURES, RATE_LIMITED, REPAIRED_REPLIES, TRUNCATED_DOCUMENTS,
    UPSTREAM_FAILURES, UPSTREAM_LATENCY,
};
use crate::models::AnalyzeRequest;
use crate::prompt::{SYSTEM_PROMPT, build_prompt};
use crate::state::AppState;

pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    identity: ClientIdentity,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    ANALYZE_REQUESTS.inc();
    info!(identity = identity.as_str(), "analyze request received");

    let model = state
        .model
        .clone()
        .ok_or_else(|| AppError::Configuration("ANTHROPIC_API_KEY not configured".to_string()))?;

    if !state.rate_limiter.try_increment(identity.as_str()) {
        RATE_LIMITED.inc();
        return Err(AppError::RateLimited(
            state.rate_limiter.status(identity.as_str()),
        ));
    }

    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let content = request
        .file_content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No file content provided".to_string()))?;

    let document = truncate_document(&content, state.max_document_chars);
    if document.is_truncated() {
        TRUNCATED_DOCUMENTS.inc();
        info!(
            original = document.original_chars,
            kept = document.kept_chars,
            budget = state.max_document_chars,
            "document exceeds budget, analyzing first part only"
        );
    }

    let start_time = Instant::now();
    let reply = model
        .complete(SYSTEM_PROMPT, &build_prompt(&document))
        .await
        .inspect_err(|_| UPSTREAM_FAILURES.inc())?;
    UPSTREAM_LATENCY.observe(start_time.elapsed().as_secs_f64());
    debug!(reply = %reply, "raw model reply");

    let extraction = state.extractor.parse(&reply).map_err(|source| {
        PARSE_FAILURES.inc();
        AppError::Parse {
            source,
            raw_preview: reply_preview(&reply, state.raw_preview_chars),
        }
    })?;
    if extraction.repaired {
        REPAIRED_REPLIES.inc();
    }

    let mut response = Json(extraction.result).into_response();
    if document.is_truncated() {
        response
            .headers_mut()
            .insert("X-Document-Truncated", HeaderValue::from_static("true"));
    }
    Ok(response)
}
