// Module: http
// Playlist, redirect, debug and health routes

pub mod debug;
pub mod error;
pub mod health;
pub mod hls;

use axum::http::{HeaderValue, Method};
use axum::Router;
use hlsgate_core::{Config, ObjectStore, PresignService, StorageKey};
use hlsgate_proxy::PlaylistRewriter;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ObjectStore>,
    pub presign_service: Arc<PresignService>,
    pub rewriter: Arc<PlaylistRewriter>,
}

impl AppState {
    /// Wire the services for `config` on top of `store`
    ///
    /// Fails when the store signs with a different addressing style than
    /// the configured one.
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> hlsgate_core::Result<Self> {
        let presign_service = PresignService::new(
            Arc::clone(&store),
            config.storage.presign_expiry(),
            config.storage.addressing_style,
            config.request_timeout(),
        )?;
        let rewriter = PlaylistRewriter::new(config.hls.api_base(), &config.hls.allowed_prefix);

        Ok(Self {
            config: Arc::new(config),
            store,
            presign_service: Arc::new(presign_service),
            rewriter: Arc::new(rewriter),
        })
    }

    /// Validate a key taken from a request path
    pub fn request_key(&self, raw: &str) -> hlsgate_core::Result<StorageKey> {
        StorageKey::from_request_path(raw, &self.config.hls.allowed_prefix)
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(health::create_health_router())
        .merge(hls::create_hls_router());

    if state.config.hls.debug_routes {
        tracing::warn!("Debug presign route enabled; it discloses signed URLs");
        router = router.merge(debug::create_debug_router());
    }

    // Apply layers before state
    let router = router
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http());

    // Apply state to all routes (must be last)
    router.with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any);

    if config.hls.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .hls
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
