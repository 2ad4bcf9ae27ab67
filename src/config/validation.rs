//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Validation is a pure
//! function that reports every problem at once rather than the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listen port is not set (use PORT or [listener].port)")]
    MissingPort,

    #[error("listen port must be non-zero")]
    ZeroPort,

    #[error("rpc.cert_path and rpc.key_path must be set together")]
    IncompleteIdentity,

    #[error("rpc.cache_ttl_secs must be greater than zero")]
    ZeroCacheTtl,

    #[error("rpc.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("invalid rpc.url '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },

    #[error("invalid metrics.address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a loaded configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.listener.port {
        None => errors.push(ValidationError::MissingPort),
        Some(0) => errors.push(ValidationError::ZeroPort),
        Some(_) => {}
    }

    if config.rpc.cert_path.is_some() != config.rpc.key_path.is_some() {
        errors.push(ValidationError::IncompleteIdentity);
    }

    if config.rpc.cache_ttl_secs == Some(0) {
        errors.push(ValidationError::ZeroCacheTtl);
    }

    if config.rpc.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    if let Some(raw) = &config.rpc.url {
        if let Err(e) = url::Url::parse(raw) {
            errors.push(ValidationError::InvalidRpcUrl {
                url: raw.clone(),
                reason: e.to_string(),
            });
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.metrics.address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
