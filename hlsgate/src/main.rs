mod server;

use anyhow::Result;
use clap::Parser;
use hlsgate_api::{create_router, AppState};
use hlsgate_core::{bootstrap::load_config, logging, storage::S3ObjectStore, ObjectStore};
use std::sync::Arc;
use tracing::{info, warn};

use crate::server::HlsGateServer;

#[derive(Parser, Debug)]
#[command(name = "hlsgate")]
#[command(about = "HLS playlist rewriting and presigned delivery gateway", long_about = None)]
struct Args {
    /// Config file (YAML or TOML); must exist when given
    #[arg(long)]
    config: Option<String>,

    /// HTTP listen host, overrides server.host
    #[arg(long)]
    host: Option<String>,

    /// HTTP listen port, overrides server.http_port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load and validate configuration
    let mut config = load_config(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.http_port = port;
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("hlsgate starting...");
    info!("HTTP address: {}", config.http_address());
    info!(
        bucket = %config.storage.bucket,
        endpoint = %config.storage.endpoint,
        addressing_style = %config.storage.addressing_style,
        allowed_prefix = %config.hls.allowed_prefix,
        presign_expires_seconds = config.storage.presign_expires_seconds,
        "Object storage"
    );
    if config.hls.public_base_url.is_empty() {
        info!("No public base URL configured, rewritten playlists use root-relative URLs");
    }
    if config.hls.debug_routes {
        warn!("Debug routes are enabled; do not run this configuration in production");
    }

    // 3. Object store
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.storage)?);

    // 4. Services and routes (fails if the store disagrees on addressing style)
    let address = config.http_address();
    let state = AppState::new(config, store)?;
    let router = create_router(state);

    // 5. Serve until shutdown
    HlsGateServer::new(address, router).start().await
}
