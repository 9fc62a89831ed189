use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use souk_auth::CredentialIssuer;
use souk_gateway::{
    build_app, AuthConfig, BackendConfig, Gateway, GatewayConfig, HttpBackendClient, RouteConfig,
};

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn serve(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone)]
struct StubBackend {
    hits: Arc<AtomicUsize>,
}

/// A minimal orders backend that echoes the subject header it received.
async fn stub_orders(State(stub): State<StubBackend>, headers: HeaderMap) -> Json<serde_json::Value> {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    let subject = headers
        .get("x-souk-subject")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "subject": subject }))
}

/// A gateway wired to one stub `orders` backend, both on ephemeral ports.
struct Stack {
    gateway: TestServer,
    _backend: TestServer,
    hits: Arc<AtomicUsize>,
}

async fn spawn_gateway(forward_subject_header: bool) -> Stack {
    let hits = Arc::new(AtomicUsize::new(0));
    let backend_app = Router::new()
        .route("/orders", get(stub_orders))
        .with_state(StubBackend {
            hits: Arc::clone(&hits),
        });
    let backend = TestServer::serve(backend_app).await;

    let config = GatewayConfig {
        backends: vec![BackendConfig {
            name: "orders".into(),
            base_url: backend.base_url.clone(),
        }],
        routes: vec![RouteConfig {
            prefix: "/orders".into(),
            methods: None,
            backend: "orders".into(),
            auth_required: true,
        }],
        auth: AuthConfig {
            secret: SECRET.into(),
            skew_seconds: 60,
        },
        timeout_ms: 5_000,
        forward_subject_header,
        aggregate: None,
    };

    let gateway = Gateway::new(config, Arc::new(HttpBackendClient::new())).unwrap();
    let app = build_app(Arc::new(gateway));
    let server = TestServer::serve(app).await;

    Stack {
        gateway: server,
        _backend: backend,
        hits,
    }
}

fn valid_token() -> String {
    CredentialIssuer::new(SECRET.as_bytes())
        .issue("customer-17", Utc::now())
        .expect("failed to issue credential")
        .token
}

#[tokio::test]
async fn request_without_credential_never_touches_the_backend() {
    let stack = spawn_gateway(true).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders", stack.gateway.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(stack.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_credential_is_rejected_at_the_edge() {
    let stack = spawn_gateway(true).await;
    let client = reqwest::Client::new();

    let stale = CredentialIssuer::new(SECRET.as_bytes())
        .issue("customer-17", Utc::now() - ChronoDuration::hours(2))
        .unwrap()
        .token;

    let res = client
        .get(format!("{}/orders", stack.gateway.base_url))
        .bearer_auth(stale)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(stack.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn verified_subject_reaches_a_trusted_backend() {
    let stack = spawn_gateway(true).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders", stack.gateway.base_url))
        .bearer_auth(valid_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["subject"], "customer-17");
    assert_eq!(stack.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn subject_header_is_withheld_when_backends_are_untrusted() {
    let stack = spawn_gateway(false).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/orders", stack.gateway.base_url))
        .bearer_auth(valid_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["subject"], serde_json::Value::Null);
}

#[tokio::test]
async fn unrouted_path_is_not_found() {
    let stack = spawn_gateway(true).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/users/me", stack.gateway.base_url))
        .bearer_auth(valid_token())
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(stack.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_probe_needs_no_credential() {
    let stack = spawn_gateway(true).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", stack.gateway.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
}
