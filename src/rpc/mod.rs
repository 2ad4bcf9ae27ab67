//! Upstream full node RPC subsystem.
//!
//! # Data Flow
//! ```text
//! RpcConfig (explicit URL, or Chia root for discovery)
//!     → autoconfig.rs (config.yaml → host, port, client cert)
//!     → client.rs (pooled HTTPS client, one per process)
//!     → cache.rs (optional short-lived response cache)
//! ```
//!
//! # Constraints
//! - One attempt per call, no retries
//! - Endpoint names are passed through unvalidated
//! - Construction failure is fatal to the process

pub mod autoconfig;
pub mod cache;
pub mod client;
pub mod types;

pub use client::{RpcClient, RpcRequest, RpcResponse};
pub use types::{BlockchainState, BlockchainStateResponse, RpcError, RpcResult, SyncState};
