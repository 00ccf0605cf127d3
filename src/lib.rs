//! Disclosure analysis service: uploads become plain text, plain text becomes a
//! structured list of issues and recommendations produced by a language model.

pub mod config;
pub mod documents;
pub mod email;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod identity;
pub mod llm;
pub mod metrics;
pub mod models;
pub mod prompt;
pub mod rate_limit;
pub mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;

use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/api/analyze", post(handlers::analyze_handler))
        .route("/api/extract", post(handlers::extract_handler))
        .route("/api/email-draft", post(handlers::email_draft_handler))
        .route("/api/status", get(handlers::status_handler))
        .route("/api/version", get(handlers::version_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
