//! Transport-neutral request/response carried between gateway and backends.

use axum::http::{HeaderMap, Method, StatusCode};

/// A request as the gateway forwards it.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path plus query string, e.g. `/orders/stats/summary?year=2026`.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProxyRequest {
    pub fn new(method: Method, path_and_query: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path_and_query.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// The path component, without any query string.
    pub fn path(&self) -> &str {
        match self.path_and_query.split_once('?') {
            Some((path, _)) => path,
            None => &self.path_and_query,
        }
    }
}

/// A backend's answer, relayed verbatim to the client.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
