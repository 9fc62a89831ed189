//! Routing, edge authentication, forwarding, and fan-out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue, Method};
use chrono::{DateTime, Utc};
use thiserror::Error;

use souk_auth::CredentialVerifier;
use souk_core::SubjectId;

use crate::client::BackendClient;
use crate::config::{AggregateConfig, ConfigError, GatewayConfig};
use crate::proxy::{ProxyRequest, ProxyResponse};
use crate::table::RouteTable;

/// Header carrying the verified subject to backends on a trusted network.
pub const SUBJECT_HEADER: &str = "x-souk-subject";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No routing rule covers this path/method.
    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },

    /// Missing or invalid credential. Deliberately carries no detail about
    /// why the credential was rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// Routing table names a backend the gateway has no address for.
    #[error("unknown backend '{0}'")]
    UnknownBackend(String),

    /// The backend did not answer within the call budget. Not retried here;
    /// retry policy belongs to an outer layer.
    #[error("backend '{backend}' timed out after {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },

    /// The backend could not be reached or failed mid-response.
    #[error("backend '{backend}' failed: {message}")]
    Upstream { backend: String, message: String },

    /// A fan-out aggregate had at least one failing call. Never reported as
    /// a (partial) success.
    #[error("aggregate failed: backend '{backend}': {message}")]
    PartialFailure { backend: String, message: String },
}

pub struct Gateway {
    table: RouteTable,
    backends: HashMap<String, String>,
    verifier: CredentialVerifier,
    client: Arc<dyn BackendClient>,
    timeout: Duration,
    timeout_ms: u64,
    forward_subject_header: bool,
    aggregate: Option<AggregateConfig>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, client: Arc<dyn BackendClient>) -> Result<Self, ConfigError> {
        let table = RouteTable::compile(&config.routes)?;
        let backends = config
            .backends
            .iter()
            .map(|b| (b.name.clone(), b.base_url.clone()))
            .collect();
        let verifier = CredentialVerifier::with_skew(
            config.auth.secret.as_bytes(),
            chrono::Duration::seconds(config.auth.skew_seconds),
        );

        Ok(Self {
            table,
            backends,
            verifier,
            client,
            timeout: Duration::from_millis(config.timeout_ms),
            timeout_ms: config.timeout_ms,
            forward_subject_header: config.forward_subject_header,
            aggregate: config.aggregate,
        })
    }

    /// Route one inbound request to its owning backend.
    ///
    /// For auth-required routes the credential is checked here, before any
    /// forwarding: a request that fails verification never reaches a
    /// backend.
    pub async fn route(
        &self,
        mut req: ProxyRequest,
        now: DateTime<Utc>,
    ) -> Result<ProxyResponse, GatewayError> {
        if let Some(aggregate) = &self.aggregate {
            if req.path() == aggregate.path {
                return self.aggregate_route(aggregate.clone(), req, now).await;
            }
        }

        let rule = self
            .table
            .resolve(req.path(), &req.method)
            .ok_or_else(|| GatewayError::NotFound {
                method: req.method.clone(),
                path: req.path().to_string(),
            })?;

        if rule.auth_required {
            let subject = self.authenticate(&req.headers, now)?;
            self.attach_subject(&mut req.headers, &subject)?;
        }

        let backend = rule.backend.clone();
        self.forward(&backend, req).await
    }

    /// Issue the same request to several backends concurrently and merge
    /// the bodies keyed by backend name.
    ///
    /// All calls settle before the merge; if any required call fails the
    /// whole aggregate fails with the offending backend named.
    pub async fn fan_out(
        &self,
        backends: &[String],
        req: &ProxyRequest,
    ) -> Result<Vec<(String, ProxyResponse)>, GatewayError> {
        let mut handles = Vec::with_capacity(backends.len());
        for name in backends {
            let name = name.clone();
            let base_url = self
                .backends
                .get(&name)
                .cloned()
                .ok_or_else(|| GatewayError::UnknownBackend(name.clone()))?;
            let client = Arc::clone(&self.client);
            let call = req.clone();
            let timeout = self.timeout;
            let timeout_ms = self.timeout_ms;

            handles.push(tokio::spawn(async move {
                let result = match tokio::time::timeout(timeout, client.send(&base_url, call)).await
                {
                    Err(_) => Err(GatewayError::Timeout {
                        backend: name.clone(),
                        timeout_ms,
                    }),
                    Ok(Err(e)) => Err(GatewayError::Upstream {
                        backend: name.clone(),
                        message: e.to_string(),
                    }),
                    Ok(Ok(response)) => Ok(response),
                };
                (name, result)
            }));
        }

        // Let every call settle before judging the aggregate.
        let mut settled = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => settled.push(outcome),
                Err(e) => {
                    return Err(GatewayError::PartialFailure {
                        backend: "<task>".to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }

        let mut merged = Vec::with_capacity(settled.len());
        for (name, outcome) in settled {
            match outcome {
                Ok(response) if response.is_success() => merged.push((name, response)),
                Ok(response) => {
                    return Err(GatewayError::PartialFailure {
                        backend: name,
                        message: format!("status {}", response.status),
                    })
                }
                Err(e) => {
                    return Err(GatewayError::PartialFailure {
                        backend: name,
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(merged)
    }

    async fn aggregate_route(
        &self,
        aggregate: AggregateConfig,
        mut req: ProxyRequest,
        now: DateTime<Utc>,
    ) -> Result<ProxyResponse, GatewayError> {
        if aggregate.auth_required {
            let subject = self.authenticate(&req.headers, now)?;
            self.attach_subject(&mut req.headers, &subject)?;
        }

        let parts = self.fan_out(&aggregate.backends, &req).await?;

        let mut merged = serde_json::Map::new();
        for (name, response) in parts {
            let value = serde_json::from_slice(&response.body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&response.body).into_owned())
            });
            merged.insert(name, value);
        }

        let body = serde_json::Value::Object(merged).to_string().into_bytes();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(ProxyResponse {
            status: axum::http::StatusCode::OK,
            headers,
            body,
        })
    }

    fn authenticate(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<SubjectId, GatewayError> {
        let token = bearer_token(headers).ok_or(GatewayError::Unauthorized)?;
        self.verifier.verify(token, now).map_err(|e| {
            tracing::debug!(error = %e, "credential rejected at the edge");
            GatewayError::Unauthorized
        })
    }

    fn attach_subject(
        &self,
        headers: &mut HeaderMap,
        subject: &SubjectId,
    ) -> Result<(), GatewayError> {
        // Never trust a client-supplied subject header.
        headers.remove(SUBJECT_HEADER);
        if self.forward_subject_header {
            // Subjects are printable ASCII by construction.
            let value =
                HeaderValue::from_str(subject.as_str()).map_err(|_| GatewayError::Unauthorized)?;
            headers.insert(SUBJECT_HEADER, value);
        }
        Ok(())
    }

    async fn forward(
        &self,
        backend: &str,
        req: ProxyRequest,
    ) -> Result<ProxyResponse, GatewayError> {
        let base_url = self
            .backends
            .get(backend)
            .ok_or_else(|| GatewayError::UnknownBackend(backend.to_string()))?;

        match tokio::time::timeout(self.timeout, self.client.send(base_url, req)).await {
            Err(_) => Err(GatewayError::Timeout {
                backend: backend.to_string(),
                timeout_ms: self.timeout_ms,
            }),
            Ok(Err(e)) => Err(GatewayError::Upstream {
                backend: backend.to_string(),
                message: e.to_string(),
            }),
            Ok(Ok(response)) => Ok(response),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
