//! `souk-gateway` — the single entry point in front of the souk services.
//!
//! The gateway owns three jobs: map an inbound request to the backend that
//! owns its path, enforce the credential check at the edge so invalid
//! traffic never reaches a backend, and fan out aggregate reads across
//! backends without ever returning a silently partial result.
//!
//! Whether backends additionally trust the subject header the gateway
//! injects is an explicit configuration decision
//! ([`config::GatewayConfig::forward_subject_header`]), not an assumption:
//! outside a private network, backends re-verify the bearer token
//! themselves.

pub mod app;
pub mod client;
pub mod config;
pub mod gateway;
pub mod proxy;
pub mod table;

pub use app::build_app;
pub use client::{BackendClient, BackendError, HttpBackendClient};
pub use config::{
    AggregateConfig, AuthConfig, BackendConfig, ConfigError, GatewayConfig, RouteConfig,
};
pub use gateway::{Gateway, GatewayError, SUBJECT_HEADER};
pub use proxy::{ProxyRequest, ProxyResponse};
pub use table::{RouteRule, RouteTable};
