//! Readiness probing against the full node.

use std::sync::Arc;

use crate::observability::metrics;
use crate::rpc::{BlockchainStateResponse, RpcClient, RpcResult};

/// Reports whether the upstream node has finished syncing.
#[derive(Debug, Clone)]
pub struct ReadinessProber {
    client: Arc<RpcClient>,
}

impl ReadinessProber {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }

    /// Query the node and report its sync flag. Never fails: errors and
    /// missing state are reported as not ready.
    pub async fn is_ready(&self) -> bool {
        let ready = evaluate(self.client.query_blockchain_state().await);
        metrics::record_readiness(ready);
        ready
    }
}

/// Map a `get_blockchain_state` outcome to readiness.
pub fn evaluate(result: RpcResult<BlockchainStateResponse>) -> bool {
    match result {
        Ok(response) => match response.blockchain_state {
            Some(state) => {
                if !state.sync.synced {
                    tracing::debug!(
                        sync_mode = state.sync.sync_mode,
                        progress = state.sync.sync_progress_height,
                        tip = state.sync.sync_tip_height,
                        "Upstream node not synced"
                    );
                }
                state.sync.synced
            }
            None => {
                tracing::warn!("Upstream response has no blockchain_state");
                false
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{BlockchainState, RpcError, SyncState};

    fn state(synced: bool) -> BlockchainStateResponse {
        BlockchainStateResponse {
            success: Some(true),
            error: None,
            blockchain_state: Some(BlockchainState {
                sync: SyncState {
                    synced,
                    ..SyncState::default()
                },
                ..BlockchainState::default()
            }),
        }
    }

    #[test]
    fn test_synced_is_ready() {
        assert!(evaluate(Ok(state(true))));
    }

    #[test]
    fn test_not_synced_is_not_ready() {
        assert!(!evaluate(Ok(state(false))));
    }

    #[test]
    fn test_missing_state_is_not_ready() {
        assert!(!evaluate(Ok(BlockchainStateResponse::default())));
    }

    #[test]
    fn test_error_is_not_ready() {
        assert!(!evaluate(Err(RpcError::Upstream("node starting".into()))));
    }
}
