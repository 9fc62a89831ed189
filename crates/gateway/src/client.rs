//! Backend transport seam.

use async_trait::async_trait;
use axum::http::header;
use thiserror::Error;

use crate::proxy::{ProxyRequest, ProxyResponse};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

/// How the gateway reaches a backend.
///
/// Deadlines are enforced by the gateway around `send`; implementations do
/// not need their own timeout policy.
#[async_trait]
pub trait BackendClient: Send + Sync {
    async fn send(&self, base_url: &str, req: ProxyRequest)
        -> Result<ProxyResponse, BackendError>;
}

/// Production client over reqwest.
#[derive(Clone, Default)]
pub struct HttpBackendClient {
    http: reqwest::Client,
}

impl HttpBackendClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn send(
        &self,
        base_url: &str,
        req: ProxyRequest,
    ) -> Result<ProxyResponse, BackendError> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), req.path_and_query);

        // Connection-level headers are owned by each hop, not forwarded.
        let mut headers = req.headers;
        headers.remove(header::HOST);
        headers.remove(header::CONNECTION);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::TRANSFER_ENCODING);

        let response = self
            .http
            .request(req.method, url)
            .headers(headers)
            .body(req.body)
            .send()
            .await
            .map_err(|e| BackendError(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError(e.to_string()))?
            .to_vec();

        Ok(ProxyResponse {
            status,
            headers,
            body,
        })
    }
}
