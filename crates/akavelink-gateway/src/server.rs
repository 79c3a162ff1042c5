//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use akavelink_storage::StorageClient;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Run the gateway server until Ctrl+C
pub async fn run_server(config: GatewayConfig, client: Arc<dyn StorageClient>) -> anyhow::Result<()> {
    run_server_with_shutdown(config, client, ctrl_c()).await
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run server with graceful shutdown
///
/// When `shutdown_signal` resolves the server stops accepting connections,
/// cancels bucket drains in progress, and waits for open requests to finish.
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    client: Arc<dyn StorageClient>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone(), client));
    let shutdown = state.shutdown.clone();
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("AkaveLink gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal.await;
            info!("Shutdown requested, cancelling bucket drains");
            shutdown.cancel();
        })
        .await?;

    info!("Gateway shutdown complete");

    Ok(())
}
