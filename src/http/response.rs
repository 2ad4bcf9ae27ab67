//! Fixed responses and the proxied response shape.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Body of `GET /`.
pub const INDEX_BODY: &str = "chia-rpc-proxy is running";

/// Body of `GET /ready` when the node is synced.
pub const READY_BODY: &str = "OK";

/// Body of `GET /ready` otherwise.
pub const NOT_READY_BODY: &str = "NOT READY";

/// Message returned when the upstream call fails.
pub const RPC_ERROR_MESSAGE: &str = "error while calling RPC";

/// JSON error envelope, matching the node's own `success`/`message` shape.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub message: &'static str,
}

/// 500 with the fixed RPC error envelope.
pub fn rpc_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope {
            success: false,
            message: RPC_ERROR_MESSAGE,
        }),
    )
        .into_response()
}

/// Upstream status and body, always labelled as JSON.
pub fn proxied(status: StatusCode, body: Body) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
