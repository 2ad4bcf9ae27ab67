//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with index, readiness and proxy routes
//! - Wire up middleware (request ID, access logging)
//! - Serve on a bound listener until shutdown

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::health::ReadinessProber;
use crate::http::proxy::proxy_handler;
use crate::http::request::UuidRequestId;
use crate::http::response::{INDEX_BODY, NOT_READY_BODY, READY_BODY};
use crate::lifecycle::ShutdownSignal;
use crate::rpc::RpcClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<RpcClient>,
    pub readiness: ReadinessProber,
}

impl AppState {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            readiness: ReadinessProber::new(client.clone()),
            client,
        }
    }
}

/// HTTP front end of the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server around an initialized RPC client.
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            router: build_router(AppState::new(client)),
        }
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ready", get(ready))
        .route("/rpc/{endpoint}", get(proxy_handler).post(proxy_handler))
        .route("/endpoint/{endpoint}", get(proxy_handler).post(proxy_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
}

async fn index() -> &'static str {
    INDEX_BODY
}

async fn ready(State(state): State<AppState>) -> Response {
    if state.readiness.is_ready().await {
        (StatusCode::OK, READY_BODY).into_response()
    } else {
        (StatusCode::BAD_REQUEST, NOT_READY_BODY).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RpcConfig;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config = RpcConfig {
            url: Some("http://127.0.0.1:1".into()),
            cache_ttl_secs: None,
            ..RpcConfig::default()
        };
        build_router(AppState::new(Arc::new(RpcClient::new(&config).unwrap())))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_index() {
        let res = test_router().oneshot(request(Method::GET, "/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], INDEX_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_proxy_route_requires_endpoint() {
        let res = test_router()
            .oneshot(request(Method::POST, "/rpc/"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_proxy_route_methods() {
        let res = test_router()
            .oneshot(request(Method::PUT, "/rpc/get_blockchain_state"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_ready_degrades_to_not_ready() {
        let res = test_router()
            .oneshot(request(Method::GET, "/ready"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], NOT_READY_BODY.as_bytes());
    }
}
