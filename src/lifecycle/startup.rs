//! Startup orchestration.
//!
//! # Order
//! 1. RPC client (fatal on failure, no degraded mode)
//! 2. Metrics exporter (optional)
//! 3. Listener bind (fatal on failure)
//! 4. Serve until shutdown
//!
//! The client exists before the first connection is accepted and is only
//! ever shared read-only.

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::rpc::{RpcClient, RpcError};

/// Fatal startup or serving errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("listen port is not configured")]
    MissingPort,

    #[error("failed to initialize RPC client: {0}")]
    Rpc(#[from] RpcError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(std::io::Error),
}

/// Bring the proxy up and serve until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    run_until(config, shutdown).await
}

/// Bring the proxy up and serve until `shutdown` is triggered.
pub async fn run_until(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let address = config
        .listener
        .bind_address()
        .ok_or(StartupError::MissingPort)?;

    let client = Arc::new(RpcClient::new(&config.rpc)?);

    if config.metrics.enabled {
        match config.metrics.address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.metrics.address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let server = HttpServer::new(client);
    server
        .run(listener, shutdown.subscribe())
        .await
        .map_err(StartupError::Serve)
}
