//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use chia_rpc_proxy::config::RpcConfig;
use chia_rpc_proxy::{HttpServer, RpcClient, Shutdown};

/// A proxy running in the background, stopped on drop.
pub struct TestProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a proxy in front of `rpc_url`.
pub async fn start_proxy(rpc_url: &str, cache_ttl_secs: Option<u64>) -> TestProxy {
    let config = RpcConfig {
        url: Some(rpc_url.to_string()),
        cache_ttl_secs,
        ..RpcConfig::default()
    };
    let client = Arc::new(RpcClient::new(&config).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(client);
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// HTTP client that never goes through a system proxy.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Start a backend that accepts connections and closes them without
/// answering. Returns its base URL.
pub async fn start_dropping_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    format!("http://{}", addr)
}

/// Start a raw HTTP/1.1 backend that answers every request with `status`
/// and a chunked `body`. Returns its base URL.
pub async fn start_chunked_backend(status: &'static str, chunks: Vec<&'static str>) -> String {
    start_slow_chunked_backend(status, chunks, Duration::ZERO).await
}

/// Like [`start_chunked_backend`], pausing for `delay` after each chunk
/// but the last.
pub async fn start_slow_chunked_backend(
    status: &'static str,
    chunks: Vec<&'static str>,
    delay: Duration,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n",
                    status
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }

                let last = chunks.len().saturating_sub(1);
                for (i, chunk) in chunks.iter().enumerate() {
                    let frame = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
                    if socket.write_all(frame.as_bytes()).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    if i < last && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }

                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
