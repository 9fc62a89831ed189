//! Gateway configuration, injected at process start.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use axum::http::Method;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("route '{prefix}' names unknown backend '{backend}'")]
    UnknownBackend { prefix: String, backend: String },

    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    #[error("config must declare at least one route")]
    NoRoutes,
}

/// A backend the gateway can forward to.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub name: String,
    /// Base URL without a trailing slash, e.g. `http://orders:8003`.
    pub base_url: String,
}

/// One routing rule: path prefix + method set → owning backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub prefix: String,
    /// Restrict to these methods; absent means all methods.
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    pub backend: String,
    #[serde(default)]
    pub auth_required: bool,
}

/// A fan-out endpoint: one gateway path answered by merging several
/// backends' responses.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateConfig {
    pub path: String,
    pub backends: Vec<String>,
    #[serde(default = "default_true")]
    pub auth_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the credential issuer.
    pub secret: String,
    #[serde(default = "default_skew_seconds")]
    pub skew_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub backends: Vec<BackendConfig>,
    pub routes: Vec<RouteConfig>,
    pub auth: AuthConfig,
    /// Per-backend call budget; a timeout is a backend failure, not a retry
    /// trigger.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Inject the verified subject as a trusted header when forwarding.
    /// Enable only when gateway and backends share a private network.
    #[serde(default)]
    pub forward_subject_header: bool,
    #[serde(default)]
    pub aggregate: Option<AggregateConfig>,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_skew_seconds() -> i64 {
    souk_auth::DEFAULT_SKEW_SECONDS
}

fn default_true() -> bool {
    true
}

impl GatewayConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.routes.is_empty() {
            return Err(ConfigError::NoRoutes);
        }

        let known = |name: &str| self.backends.iter().any(|b| b.name == name);

        for route in &self.routes {
            if !known(&route.backend) {
                return Err(ConfigError::UnknownBackend {
                    prefix: route.prefix.clone(),
                    backend: route.backend.clone(),
                });
            }
            if let Some(methods) = &route.methods {
                for method in methods {
                    parse_method(method)?;
                }
            }
        }

        if let Some(aggregate) = &self.aggregate {
            for backend in &aggregate.backends {
                if !known(backend) {
                    return Err(ConfigError::UnknownBackend {
                        prefix: aggregate.path.clone(),
                        backend: backend.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

pub(crate) fn parse_method(raw: &str) -> Result<Method, ConfigError> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(raw.to_string()))
}
