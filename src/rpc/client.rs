//! Full node RPC client.
//!
//! # Responsibilities
//! - Connect to the node RPC server with the node's client certificate
//! - Build requests addressed to a named endpoint
//! - Execute requests with a single attempt, optionally through the cache
//! - Query chain sync state for readiness

use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use bytes::{Bytes, BytesMut};
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use reqwest::{Identity, Url};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::RpcConfig;
use crate::rpc::autoconfig;
use crate::rpc::cache::{CacheKey, CachingStream, ResponseCache};
use crate::rpc::types::{BlockchainStateResponse, RpcError, RpcResult};

const JSON: &str = "application/json";

/// Client for the upstream full node.
///
/// Built once at startup and shared behind an `Arc`; all methods take `&self`.
pub struct RpcClient {
    http: reqwest::Client,
    base_url: Url,
    cache: Option<Arc<ResponseCache>>,
}

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct RpcRequest {
    endpoint: String,
    inner: reqwest::Request,
    cache_key: Option<CacheKey>,
}

impl RpcRequest {
    /// Endpoint (procedure) name.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Fully resolved upstream URL.
    pub fn url(&self) -> &Url {
        self.inner.url()
    }

    #[cfg(test)]
    fn headers(&self) -> &header::HeaderMap {
        self.inner.headers()
    }

    #[cfg(test)]
    fn body(&self) -> Option<&[u8]> {
        self.inner.body().and_then(|b| b.as_bytes())
    }
}

type ChunkStream = BoxStream<'static, reqwest::Result<Bytes>>;

enum ResponseBody {
    Stream(ChunkStream),
    Buffered(Bytes),
}

/// Upstream response: status plus a body that is either still streaming
/// from the node or was served from the cache.
pub struct RpcResponse {
    status: StatusCode,
    body: ResponseBody,
    from_cache: bool,
}

impl RpcResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether this response was served from the cache.
    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    /// Read the whole body.
    pub async fn bytes(self) -> RpcResult<Bytes> {
        match self.body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Stream(stream) => {
                let buf = stream
                    .try_fold(BytesMut::new(), |mut buf, chunk| async move {
                        buf.extend_from_slice(&chunk);
                        Ok(buf)
                    })
                    .await?;
                Ok(buf.freeze())
            }
        }
    }

    /// Convert into a body that forwards upstream chunks as they arrive.
    pub fn into_body(self) -> Body {
        match self.body {
            ResponseBody::Buffered(bytes) => Body::from(bytes),
            ResponseBody::Stream(stream) => Body::from_stream(
                stream.inspect_err(|e| tracing::warn!(error = %e, "Upstream body stream failed")),
            ),
        }
    }
}

impl RpcClient {
    /// Create the client.
    ///
    /// With no `url` configured, the node address and client certificate are
    /// discovered from the Chia root. Explicit `cert_path`/`key_path` take
    /// precedence over discovered ones.
    pub fn new(config: &RpcConfig) -> RpcResult<Self> {
        let (base_url, discovered_identity) = match &config.url {
            Some(url) => (url.clone(), None),
            None => {
                let root = autoconfig::resolve_root(config.chia_root.as_deref());
                let endpoint = autoconfig::discover(&root)?;
                (endpoint.base_url, Some((endpoint.cert_path, endpoint.key_path)))
            }
        };

        let identity_paths = match (&config.cert_path, &config.key_path) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => discovered_identity,
        };

        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some((cert, key)) = &identity_paths {
            builder = builder.identity(load_identity(cert, key)?);
        }

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder.build().map_err(RpcError::ClientBuild)?;
        let base_url = parse_base_url(&base_url)?;
        let cache = config
            .cache_ttl_secs
            .map(|secs| Arc::new(ResponseCache::new(Duration::from_secs(secs))));

        tracing::info!(
            base_url = %base_url,
            client_cert = identity_paths.is_some(),
            cache_ttl_secs = ?config.cache_ttl_secs,
            timeout_secs = ?config.timeout_secs,
            "RPC client initialized"
        );

        Ok(Self {
            http,
            base_url,
            cache,
        })
    }

    /// Build a request for `endpoint`.
    ///
    /// The endpoint is not checked against a list of known procedures; the
    /// node rejects unknown names. JSON `Accept` and `Content-Type` headers
    /// are always set.
    pub fn build_request(&self, endpoint: &str, method: Method, body: Bytes) -> RpcResult<RpcRequest> {
        let invalid = |reason: String| RpcError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };

        if endpoint.is_empty() {
            return Err(invalid("empty endpoint".to_string()));
        }

        let url = self.base_url.join(endpoint).map_err(|e| invalid(e.to_string()))?;
        if url.origin() != self.base_url.origin() {
            return Err(invalid("endpoint resolves outside the RPC server".to_string()));
        }

        let inner = self
            .http
            .request(method.clone(), url)
            .header(header::ACCEPT, JSON)
            .header(header::CONTENT_TYPE, JSON)
            .body(body.clone())
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        let cache_key = self.cache.as_ref().map(|_| CacheKey {
            method,
            endpoint: endpoint.to_string(),
            body,
        });

        Ok(RpcRequest {
            endpoint: endpoint.to_string(),
            inner,
            cache_key,
        })
    }

    /// Send a request. One attempt, no retry.
    pub async fn execute(&self, request: RpcRequest) -> RpcResult<RpcResponse> {
        tracing::debug!(
            endpoint = %request.endpoint(),
            method = %request.method(),
            url = %request.url(),
            "Executing RPC request"
        );

        let RpcRequest {
            endpoint,
            inner,
            cache_key,
        } = request;

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(hit) = cache.get(key) {
                tracing::debug!(endpoint = %endpoint, status = %hit.status, "RPC cache hit");
                return Ok(RpcResponse {
                    status: hit.status,
                    body: ResponseBody::Buffered(hit.body),
                    from_cache: true,
                });
            }
        }

        let response = self.http.execute(inner).await.map_err(|e| {
            tracing::warn!(endpoint = %endpoint, error = %e, "RPC request failed");
            RpcError::Transport(e)
        })?;
        let status = response.status();
        let chunks = Box::pin(response.bytes_stream());

        // Successful bodies are stored as they pass through, never buffered
        // ahead of the caller.
        let stream: ChunkStream = match (&self.cache, cache_key) {
            (Some(cache), Some(key)) if status.is_success() => {
                Box::pin(CachingStream::new(chunks, Arc::clone(cache), key, status))
            }
            _ => chunks,
        };

        Ok(RpcResponse {
            status,
            body: ResponseBody::Stream(stream),
            from_cache: false,
        })
    }

    /// Fetch `get_blockchain_state`.
    pub async fn query_blockchain_state(&self) -> RpcResult<BlockchainStateResponse> {
        let request =
            self.build_request("get_blockchain_state", Method::POST, Bytes::from_static(b"{}"))?;
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Upstream(format!("unexpected status {}", status)));
        }

        let body = response.bytes().await?;
        let state: BlockchainStateResponse = serde_json::from_slice(&body)?;

        if state.success == Some(false) {
            return Err(RpcError::Upstream(
                state.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(state)
    }

    /// Base URL every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cache lifetime, if caching is enabled.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache.as_ref().map(|cache| cache.ttl())
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("base_url", &self.base_url().as_str())
            .field("cache_ttl", &self.cache_ttl())
            .finish()
    }
}

fn parse_base_url(raw: &str) -> RpcResult<Url> {
    let mut url = Url::parse(raw).map_err(|e| RpcError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(RpcError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }

    // Url::join replaces the last segment unless the path ends with '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn load_identity(cert: &Path, key: &Path) -> RpcResult<Identity> {
    let read = |path: &Path| {
        fs::read(path).map_err(|source| RpcError::Io {
            path: PathBuf::from(path),
            source,
        })
    };

    let mut pem = read(key)?;
    pem.push(b'\n');
    pem.extend(read(cert)?);

    Identity::from_pem(&pem).map_err(RpcError::ClientBuild)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(url: &str, cache_ttl_secs: Option<u64>) -> RpcClient {
        let config = RpcConfig {
            url: Some(url.to_string()),
            cache_ttl_secs,
            ..RpcConfig::default()
        };
        RpcClient::new(&config).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = test_client("http://127.0.0.1:8555", None);
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8555/");

        let client = test_client("http://127.0.0.1:8555/node", None);
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8555/node/");
    }

    #[test]
    fn test_build_request_forces_json_headers() {
        let client = test_client("http://127.0.0.1:8555", None);
        let request = client
            .build_request("get_blockchain_state", Method::POST, Bytes::from_static(b"{}"))
            .unwrap();

        assert_eq!(request.endpoint(), "get_blockchain_state");
        assert_eq!(request.url().as_str(), "http://127.0.0.1:8555/get_blockchain_state");
        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers()[header::ACCEPT], JSON);
        assert_eq!(request.headers()[header::CONTENT_TYPE], JSON);
        assert_eq!(request.body(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_build_request_rejects_foreign_origin() {
        let client = test_client("https://localhost:8555", None);
        let err = client
            .build_request("http://attacker.example/x", Method::POST, Bytes::new())
            .unwrap_err();
        assert!(matches!(err, RpcError::InvalidEndpoint { .. }));
    }

    #[test]
    fn test_build_request_rejects_empty_endpoint() {
        let client = test_client("http://127.0.0.1:8555", None);
        assert!(client.build_request("", Method::GET, Bytes::new()).is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = RpcConfig {
            url: Some("not a url".into()),
            ..RpcConfig::default()
        };
        assert!(matches!(RpcClient::new(&config), Err(RpcError::InvalidUrl { .. })));
    }

    #[test]
    fn test_missing_identity_files() {
        let config = RpcConfig {
            url: Some("https://localhost:8555".into()),
            cert_path: Some("/nonexistent/client.crt".into()),
            key_path: Some("/nonexistent/client.key".into()),
            ..RpcConfig::default()
        };
        assert!(matches!(RpcClient::new(&config), Err(RpcError::Io { .. })));
    }

    #[test]
    fn test_cache_ttl() {
        assert_eq!(test_client("http://127.0.0.1:8555", Some(5)).cache_ttl(), Some(Duration::from_secs(5)));
        assert_eq!(test_client("http://127.0.0.1:8555", None).cache_ttl(), None);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let client = test_client("http://127.0.0.1:1", None);
        let request = client
            .build_request("get_blockchain_state", Method::POST, Bytes::from_static(b"{}"))
            .unwrap();
        let err = client.execute(request).await.err().unwrap();
        assert!(matches!(err, RpcError::Transport(_)));
    }
}
