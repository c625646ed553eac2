//! Debug presign endpoint
//!
//! Only mounted when `hls.debug_routes` is enabled.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use hlsgate_core::PresignedUrl;
use serde::Deserialize;

use crate::http::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PresignQuery {
    pub key: Option<String>,
}

pub fn create_debug_router() -> Router<AppState> {
    Router::new().route("/hls-debug/presign", get(debug_presign))
}

/// Handle GET /hls-debug/presign?key=
async fn debug_presign(
    State(state): State<AppState>,
    Query(query): Query<PresignQuery>,
) -> AppResult<Json<PresignedUrl>> {
    let raw_key = query.key.ok_or_else(AppError::not_found)?;
    let key = state.request_key(&raw_key)?;

    Ok(Json(state.presign_service.presign(&key).await?))
}
