//! Proxy handler: inbound request → upstream RPC endpoint.
//!
//! # Responsibilities
//! - Use the path segment as the upstream endpoint name, verbatim
//! - Substitute `{}` for empty or one-byte bodies
//! - Relay upstream status and body unchanged
//! - Answer 500 with a fixed envelope when the upstream call fails

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method},
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, Span};

use crate::http::request::request_id;
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::{metrics, tracing::rpc_span};
use crate::rpc::RpcClient;

/// Forwarded in place of bodies too short to be JSON.
pub const EMPTY_JSON: &[u8] = b"{}";

/// Replace bodies shorter than two bytes with `{}`.
pub fn normalize_body(body: Bytes) -> Bytes {
    if body.len() < 2 {
        Bytes::from_static(EMPTY_JSON)
    } else {
        body
    }
}

/// Handler for `/rpc/{endpoint}` and `/endpoint/{endpoint}`.
pub async fn proxy_handler(
    State(state): State<AppState>,
    Path(endpoint): Path<String>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let body = normalize_body(body);

    tracing::debug!(
        request_id = %request_id(&headers),
        method = %method,
        endpoint = %endpoint,
        "Proxying RPC request"
    );

    let span = rpc_span(method.as_str(), &endpoint, &body);
    let response = forward(&state.client, &endpoint, method.clone(), body)
        .instrument(span)
        .await;

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn forward(client: &RpcClient, endpoint: &str, method: Method, body: Bytes) -> Response {
    let result = match client.build_request(endpoint, method, body) {
        Ok(request) => client.execute(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(upstream) => {
            let status = upstream.status();
            Span::current().record("status", status.as_u16());
            tracing::debug!(
                status = %status,
                cached = upstream.from_cache(),
                "Upstream responded"
            );
            response::proxied(status, upstream.into_body())
        }
        Err(e) => {
            Span::current().record("status", 500u16);
            tracing::error!(error = %e, "Error while calling RPC");
            metrics::record_upstream_error();
            response::rpc_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_bodies_become_empty_object() {
        assert_eq!(normalize_body(Bytes::new()), Bytes::from_static(b"{}"));
        assert_eq!(normalize_body(Bytes::from_static(b" ")), Bytes::from_static(b"{}"));
        assert_eq!(normalize_body(Bytes::from_static(b"x")), Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_longer_bodies_pass_through() {
        for body in [&b"{}"[..], b"[]", br#"{"header_hash":"0xabc"}"#, b"not json"] {
            let body = Bytes::copy_from_slice(body);
            assert_eq!(normalize_body(body.clone()), body);
        }
    }
}
