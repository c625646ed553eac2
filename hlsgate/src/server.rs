use axum::Router;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Time allowed for in-flight requests after a shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HlsGateServer {
    http_address: String,
    router: Router,
}

impl HlsGateServer {
    pub fn new(http_address: String, router: Router) -> Self {
        Self {
            http_address,
            router,
        }
    }

    /// Start the HTTP server and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        info!("Starting hlsgate server...");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut http_handle = self.start_http_server(shutdown_rx).await?;

        tokio::select! {
            _ = &mut http_handle => {
                error!("HTTP server stopped unexpectedly");
                return Err(anyhow::anyhow!("HTTP server stopped unexpectedly"));
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        let _ = shutdown_tx.send(true);

        if tokio::time::timeout(DRAIN_TIMEOUT, http_handle).await.is_err() {
            warn!("In-flight requests did not drain within {:?}", DRAIN_TIMEOUT);
        }

        info!("hlsgate stopped");
        Ok(())
    }

    /// Bind the listener and serve with graceful shutdown support
    async fn start_http_server(
        self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let http_addr: std::net::SocketAddr = self
            .http_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid HTTP address '{}': {e}", self.http_address))?;

        let listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_addr}: {e}"))?;

        info!("HTTP server listening on {}", http_addr);

        let router = self.router;
        let handle = tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
