//! Upstream discovery from a Chia root directory.
//!
//! Reads `<root>/config/config.yaml` to find the full node RPC address and
//! the client certificate the node expects.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::host_port;
use crate::rpc::types::{RpcError, RpcResult};

const DEFAULT_RPC_PORT: u16 = 8555;
const DEFAULT_CERT: &str = "config/ssl/full_node/private_full_node.crt";
const DEFAULT_KEY: &str = "config/ssl/full_node/private_full_node.key";

/// Connection details resolved from the node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    /// Base URL of the full node RPC server.
    pub base_url: String,
    /// Client certificate (PEM).
    pub cert_path: PathBuf,
    /// Client private key (PEM).
    pub key_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct NodeConfigFile {
    #[serde(default)]
    self_hostname: Option<String>,
    #[serde(default)]
    full_node: FullNodeSection,
}

#[derive(Debug, Default, Deserialize)]
struct FullNodeSection {
    #[serde(default)]
    rpc_port: Option<u16>,
    #[serde(default)]
    ssl: SslSection,
}

#[derive(Debug, Default, Deserialize)]
struct SslSection {
    #[serde(default)]
    private_crt: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

/// Resolve the Chia root: the configured value, else `$HOME/.chia/mainnet`.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(root) = explicit {
        return root.to_path_buf();
    }
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".chia").join("mainnet")
}

/// Read `config/config.yaml` under `root` and derive the node endpoint.
pub fn discover(root: &Path) -> RpcResult<NodeEndpoint> {
    let path = root.join("config").join("config.yaml");
    let content = fs::read_to_string(&path).map_err(|source| RpcError::Io {
        path: path.clone(),
        source,
    })?;
    let endpoint = parse_node_config(root, &content)?;

    tracing::debug!(
        config = %path.display(),
        base_url = %endpoint.base_url,
        "Discovered full node endpoint"
    );
    Ok(endpoint)
}

fn parse_node_config(root: &Path, content: &str) -> RpcResult<NodeEndpoint> {
    let file: NodeConfigFile = serde_yaml::from_str(content)?;

    let host = file
        .self_hostname
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    let port = file.full_node.rpc_port.unwrap_or(DEFAULT_RPC_PORT);

    let cert = file.full_node.ssl.private_crt.as_deref().unwrap_or(DEFAULT_CERT);
    let key = file.full_node.ssl.private_key.as_deref().unwrap_or(DEFAULT_KEY);

    Ok(NodeEndpoint {
        base_url: format!("https://{}", host_port(&host, port)),
        cert_path: root.join(cert),
        key_path: root.join(key),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
self_hostname: 127.0.0.1
full_node:
  port: 8444
  rpc_port: 18555
  ssl:
    private_crt: config/ssl/full_node/custom.crt
    private_key: config/ssl/full_node/custom.key
    public_crt: config/ssl/full_node/public_full_node.crt
"#;
        let endpoint = parse_node_config(Path::new("/chia"), yaml).unwrap();
        assert_eq!(endpoint.base_url, "https://127.0.0.1:18555");
        assert_eq!(endpoint.cert_path, PathBuf::from("/chia/config/ssl/full_node/custom.crt"));
        assert_eq!(endpoint.key_path, PathBuf::from("/chia/config/ssl/full_node/custom.key"));
    }

    #[test]
    fn test_parse_defaults() {
        let endpoint = parse_node_config(Path::new("/chia"), "network_overrides: {}\n").unwrap();
        assert_eq!(endpoint.base_url, "https://localhost:8555");
        assert_eq!(endpoint.cert_path, Path::new("/chia").join(DEFAULT_CERT));
        assert_eq!(endpoint.key_path, Path::new("/chia").join(DEFAULT_KEY));
    }

    #[test]
    fn test_parse_ipv6_hostname() {
        let yaml = "self_hostname: \"::1\"\nfull_node:\n  rpc_port: 8555\n";
        let endpoint = parse_node_config(Path::new("/chia"), yaml).unwrap();
        assert_eq!(endpoint.base_url, "https://[::1]:8555");
        assert!(url::Url::parse(&endpoint.base_url).is_ok());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = parse_node_config(Path::new("/chia"), "full_node: [unclosed").unwrap_err();
        assert!(matches!(err, RpcError::NodeConfig(_)));
    }

    #[test]
    fn test_discover_missing_root() {
        let err = discover(Path::new("/nonexistent/chia-root")).unwrap_err();
        assert!(matches!(err, RpcError::Io { .. }));
        assert!(err.to_string().contains("config.yaml"));
    }

    #[test]
    fn test_default_root_under_home() {
        assert!(resolve_root(None).ends_with(".chia/mainnet"));
    }

    #[test]
    fn test_explicit_root_wins() {
        assert_eq!(resolve_root(Some(Path::new("/srv/chia"))), PathBuf::from("/srv/chia"));
    }
}
