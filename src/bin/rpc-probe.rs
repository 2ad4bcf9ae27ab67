//! One-shot RPC call against the full node, printed as JSON.

use bytes::Bytes;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

use chia_rpc_proxy::config::loader::apply_env_overrides;
use chia_rpc_proxy::config::ProxyConfig;
use chia_rpc_proxy::rpc::RpcClient;

#[derive(Parser)]
#[command(name = "rpc-probe")]
#[command(about = "Call a full node RPC endpoint and print the response", long_about = None)]
struct Cli {
    /// Chia root used to discover the node (defaults to $CHIA_ROOT or ~/.chia/mainnet).
    #[arg(long)]
    chia_root: Option<PathBuf>,

    /// Explicit node URL, skipping discovery.
    #[arg(short, long)]
    url: Option<String>,

    /// Endpoint to call.
    #[arg(short, long, default_value = "get_blockchain_state")]
    endpoint: String,

    /// JSON request body.
    #[arg(short, long, default_value = "{}")]
    body: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ProxyConfig::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    let mut rpc = config.rpc;
    if cli.chia_root.is_some() {
        rpc.chia_root = cli.chia_root;
    }
    if cli.url.is_some() {
        rpc.url = cli.url;
    }
    rpc.cache_ttl_secs = None;

    let client = RpcClient::new(&rpc)?;

    let request = client.build_request(&cli.endpoint, reqwest::Method::POST, Bytes::from(cli.body))?;
    let response = client.execute(request).await?;
    let status = response.status();
    let body = response.bytes().await?;

    println!("Status: {}", status);
    match serde_json::from_slice::<Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", String::from_utf8_lossy(&body)),
    }

    if !status.is_success() {
        return Err(format!("endpoint returned {}", status).into());
    }
    Ok(())
}
