//! Health check endpoints
//!
//! Provides simple health check for monitoring probes.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::http::AppState;

/// Health check router
pub fn create_health_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Basic health check (always returns OK if server is running)
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "hlsgate",
        "object_storage": {
            "bucket": state.config.storage.bucket,
            "addressing_style": state.presign_service.addressing_style(),
        },
        "debug_routes": state.config.hls.debug_routes,
    }))
}
