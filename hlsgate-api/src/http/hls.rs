//! HLS routes
//!
//! - `GET /hls/{key}`: fetch a stored playlist and return it rewritten
//! - `GET|HEAD /hls-seg/{key}`: 302 to a presigned URL for the object
//!
//! Segment bytes never pass through the gateway.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use hlsgate_core::storage::bounded;
use tracing::debug;

use crate::http::{AppError, AppResult, AppState};

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// HLS router
pub fn create_hls_router() -> Router<AppState> {
    Router::new()
        .route("/hls/{*key}", get(get_playlist))
        .route("/hls-seg/{*key}", get(redirect_segment).head(head_segment))
}

/// Handle GET /hls/{key}
async fn get_playlist(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> AppResult<Response> {
    let key = state.request_key(&raw_key)?;
    if !key.is_manifest() {
        debug!(key = %key, "Playlist route asked for a non-playlist key");
        return Err(AppError::not_found());
    }

    let data = bounded(state.config.request_timeout(), state.store.get_object(&key)).await?;
    let playlist = state.rewriter.rewrite_bytes(&data, &key)?;

    debug!(key = %key, bytes = playlist.len(), "Serving rewritten playlist");

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)
        .header(
            header::CACHE_CONTROL,
            state.config.hls.manifest_cache_control.as_str(),
        );
    if state.config.hls.allows_any_origin() {
        builder = builder.header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    }

    builder
        .body(Body::from(playlist))
        .map_err(|e| AppError::internal(format!("Failed to build playlist response: {e}")))
}

/// Handle GET /hls-seg/{key}
async fn redirect_segment(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> AppResult<Response> {
    let key = state.request_key(&raw_key)?;
    let presigned = state.presign_service.presign(&key).await?;

    found(&presigned.presigned_url)
}

/// Handle HEAD /hls-seg/{key}
///
/// Redirects without touching the store unless `head_checks_existence` is set.
async fn head_segment(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> AppResult<Response> {
    let key = state.request_key(&raw_key)?;

    if state.config.hls.head_checks_existence && !state.presign_service.exists(&key).await? {
        return Err(AppError::not_found());
    }

    let presigned = state.presign_service.presign(&key).await?;
    found(&presigned.presigned_url)
}

fn found(location: &str) -> AppResult<Response> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::empty())
        .map_err(|e| AppError::internal(format!("Failed to build redirect: {e}")))
}
