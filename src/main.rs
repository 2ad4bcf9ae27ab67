//! Chia full node RPC proxy.
//!
//! Forwards HTTP requests to a single full node RPC server and reports
//! whether that node is synced.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 RPC PROXY                     │
//!   Client Request     │  ┌─────────┐    ┌─────────┐    ┌───────────┐ │
//!   ───────────────────┼─▶│  http   │───▶│  proxy  │───▶│    rpc    │─┼──▶ Full Node
//!                      │  │ server  │    │ handler │    │  client   │ │    (mTLS)
//!   Client Response    │  └─────────┘    └─────────┘    └─────┬─────┘ │
//!   ◀──────────────────┼───────────── streamed body ◀─────────┘       │
//!                      │                                              │
//!   GET /ready ────────┼─▶ health::readiness ──▶ get_blockchain_state │
//!                      │                                              │
//!                      │  config · observability · lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use chia_rpc_proxy::config::load_config;
use chia_rpc_proxy::lifecycle::startup;
use chia_rpc_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "chia-rpc-proxy")]
#[command(about = "HTTP proxy for a Chia full node RPC server", long_about = None)]
struct Cli {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    let _guard = logging::init(&config.telemetry)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = ?config.listener.port,
        cache_ttl_secs = ?config.rpc.cache_ttl_secs,
        tracing_enabled = config.telemetry.collector_url.is_some(),
        "chia-rpc-proxy starting"
    );

    if let Err(e) = startup::run(config).await {
        tracing::error!(error = %e, "Fatal error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
