use std::sync::Arc;

use souk_gateway::{build_app, Gateway, GatewayConfig, HttpBackendClient};

#[tokio::main]
async fn main() {
    souk_observability::init();

    let config_path = std::env::var("SOUK_GATEWAY_CONFIG")
        .unwrap_or_else(|_| "gateway.json".to_string());
    let config = GatewayConfig::from_file(&config_path)
        .unwrap_or_else(|e| panic!("failed to load {config_path}: {e}"));

    let client = Arc::new(HttpBackendClient::new());
    let gateway = Gateway::new(config, client).expect("invalid gateway configuration");
    let app = build_app(Arc::new(gateway));

    let addr = std::env::var("SOUK_GATEWAY_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
