//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;
use std::path::PathBuf;

/// Root configuration for the RPC proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Upstream full node connection settings.
    pub rpc: RpcConfig,

    /// Logging and span export settings.
    pub telemetry: TelemetryConfig,

    /// Prometheus metrics settings.
    pub metrics: MetricsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on. There is no default; startup aborts if unset.
    pub port: Option<u16>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

impl ListenerConfig {
    /// Socket address string, if a port has been configured.
    pub fn bind_address(&self) -> Option<String> {
        self.port.map(|port| host_port(&self.host, port))
    }
}

/// Join a host and port, bracketing IPv6 literals.
pub fn host_port(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Upstream RPC connection configuration.
///
/// With no `url`, the node address and client certificate are discovered
/// from the Chia root directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Chia root directory (`CHIA_ROOT` overrides; `~/.chia/mainnet` if unset).
    pub chia_root: Option<PathBuf>,

    /// Explicit upstream base URL (e.g., "https://localhost:8555").
    pub url: Option<String>,

    /// Client certificate (PEM) presented to the node.
    pub cert_path: Option<PathBuf>,

    /// Client private key (PEM) matching `cert_path`.
    pub key_path: Option<PathBuf>,

    /// Lifetime of cached upstream responses. `None` disables the cache.
    pub cache_ttl_secs: Option<u64>,

    /// Transport timeout for a single upstream call. `None` means no timeout.
    pub timeout_secs: Option<u64>,

    /// Skip server certificate verification (node certs use a private CA).
    pub accept_invalid_certs: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            chia_root: None,
            url: None,
            cert_path: None,
            key_path: None,
            cache_ttl_secs: Some(60),
            timeout_secs: None,
            accept_invalid_certs: true,
        }
    }
}

/// Logging and OpenTelemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name reported with exported spans.
    pub service_name: Option<String>,

    /// OTLP collector address. Span export is off when unset.
    pub collector_url: Option<String>,

    /// Talk to the collector over plaintext gRPC.
    pub insecure: bool,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: None,
            collector_url: None,
            insecure: false,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Service name, defaulting to the crate name.
    pub fn service_name(&self) -> &str {
        self.service_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(env!("CARGO_PKG_NAME"))
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus scrape endpoint.
    pub enabled: bool,

    /// Metrics endpoint bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert!(config.listener.port.is_none());
        assert!(config.listener.bind_address().is_none());
        assert_eq!(config.rpc.cache_ttl_secs, Some(60));
        assert!(config.rpc.timeout_secs.is_none());
        assert!(!config.metrics.enabled);
        assert_eq!(config.telemetry.service_name(), "chia-rpc-proxy");
    }

    #[test]
    fn test_partial_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [listener]
            port = 8080

            [rpc]
            url = "http://127.0.0.1:8555"
            cache_ttl_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address().as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.rpc.cache_ttl_secs, Some(5));
        assert!(config.rpc.accept_invalid_certs);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_ipv6_bind_address() {
        let listener = ListenerConfig {
            host: "::".to_string(),
            port: Some(8080),
        };
        assert_eq!(listener.bind_address().as_deref(), Some("[::]:8080"));
        assert!(listener.bind_address().unwrap().parse::<std::net::SocketAddr>().is_ok());

        assert_eq!(host_port("localhost", 8555), "localhost:8555");
        assert_eq!(host_port("127.0.0.1", 8555), "127.0.0.1:8555");
    }
}
