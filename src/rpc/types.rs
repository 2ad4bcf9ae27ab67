//! Full node response types and error definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the upstream node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A file needed for auto-discovery could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The node's config.yaml could not be parsed.
    #[error("invalid node config: {0}")]
    NodeConfig(#[from] serde_yaml::Error),

    /// The upstream base URL is unusable.
    #[error("invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client (TLS identity, pool) could not be built.
    #[error("failed to build RPC client: {0}")]
    ClientBuild(reqwest::Error),

    /// The endpoint name does not form a valid request.
    #[error("cannot build request for endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Connection, TLS or body transfer failed.
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("failed to decode RPC response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The node answered with `success: false`.
    #[error("RPC call failed: {0}")]
    Upstream(String),
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Response of the `get_blockchain_state` endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlockchainStateResponse {
    /// Absent on some node versions; only an explicit `false` is a failure.
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub blockchain_state: Option<BlockchainState>,
}

/// Node view of the chain.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlockchainState {
    #[serde(default)]
    pub sync: SyncState,

    #[serde(default)]
    pub peak: Option<PeakRecord>,

    #[serde(default)]
    pub difficulty: Option<u64>,

    #[serde(default)]
    pub mempool_size: Option<u64>,

    #[serde(default)]
    pub node_id: Option<String>,
}

/// Synchronization progress.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncState {
    #[serde(default)]
    pub synced: bool,

    #[serde(default)]
    pub sync_mode: bool,

    #[serde(default)]
    pub sync_progress_height: u32,

    #[serde(default)]
    pub sync_tip_height: u32,
}

/// The subset of the peak block record we read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PeakRecord {
    pub height: u32,
}
