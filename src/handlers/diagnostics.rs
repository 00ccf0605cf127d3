use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

// Reports whether an API key is configured, never the key itself
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    match &state.api_key {
        None => Json(json!({
            "status": "error",
            "message": "API key not configured",
            "keyExists": false
        })),
        Some(key) => Json(json!({
            "status": "success",
            "message": "API key configured",
            "keyExists": true,
            "keyFormat": key.starts_with("sk-"),
            "keyLength": key.len()
        })),
    }
}

pub async fn version_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.model.as_ref().map(|m| m.model_id().to_string()),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
