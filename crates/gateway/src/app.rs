//! Axum surface: health probe plus a catch-all proxy handler.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use crate::gateway::{Gateway, GatewayError};
use crate::proxy::ProxyRequest;

pub fn build_app(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(proxy)
        .with_state(gateway)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn proxy(
    State(gateway): State<Arc<Gateway>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let mut req = ProxyRequest::new(method, path_and_query);
    req.headers = headers;
    req.body = body.to_vec();

    match gateway.route(req, Utc::now()).await {
        Ok(response) => {
            let mut out = Response::new(axum::body::Body::from(response.body));
            *out.status_mut() = response.status;
            *out.headers_mut() = response.headers;
            out
        }
        Err(e) => error_response(e),
    }
}

fn error_response(error: GatewayError) -> Response {
    let (status, code) = match &error {
        GatewayError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
        GatewayError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
        GatewayError::UnknownBackend(_) => (StatusCode::BAD_GATEWAY, "unknown_backend"),
        GatewayError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "backend_timeout"),
        GatewayError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "bad_gateway"),
        GatewayError::PartialFailure { .. } => (StatusCode::BAD_GATEWAY, "partial_failure"),
    };
    if status.is_server_error() {
        tracing::warn!(error = %error, "gateway error");
    }
    let body = Json(json!({ "error": code, "message": error.to_string() }));
    (status, body).into_response()
}
