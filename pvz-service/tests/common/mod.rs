//! Common test utilities for pvz-service integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pvz_service::config::{DatabaseConfig, JwtConfig, PvzConfig};
use pvz_service::grpc::proto::pvz_service_client::PvzServiceClient;
use pvz_service::startup::{build_router, AppState, Application};
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use std::sync::Once;
use std::time::Duration;
use tonic::transport::Channel;
use tower::util::ServiceExt;

static INIT: Once = Once::new();

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,pvz_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Router over fresh in-memory stores.
pub fn in_memory_router() -> Router {
    init_tracing();
    build_router(AppState::in_memory(TEST_JWT_SECRET), Duration::from_secs(5))
}

/// Send one request through the router and decode the JSON body (Null when empty).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Obtain a token for `role` through `/dummyLogin`.
pub async fn dummy_token(app: &Router, role: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/dummyLogin",
        None,
        Some(serde_json::json!({ "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "dummyLogin failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Create a pickup point as a moderator and return its id.
pub async fn create_point(app: &Router, city: &str) -> String {
    let moderator = dummy_token(app, "moderator").await;
    let (status, body) = send(
        app,
        Method::POST,
        "/pvz",
        Some(&moderator),
        Some(serde_json::json!({ "city": city })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create pvz failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Configuration pointing at the test database, with ephemeral ports.
pub fn test_config() -> PvzConfig {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run database tests");

    PvzConfig {
        common: CommonConfig { port: 0 },
        service_name: "pvz-service-test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 10,
            min_connections: 1,
        },
        grpc_port: 0,
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            expiry_minutes: 60,
        },
        request_timeout_secs: 5,
    }
}

/// Running application reachable over HTTP and gRPC.
pub struct TestApp {
    pub http_address: String,
    pub grpc: PvzServiceClient<Channel>,
}

/// Spawn the application against the test database.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let app = Application::build(test_config())
        .await
        .expect("Failed to build application");

    let http_address = format!("http://127.0.0.1:{}", app.http_port());
    let grpc_addr = format!("http://127.0.0.1:{}", app.grpc_port());

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    let grpc = {
        let mut attempts = 0;
        loop {
            match PvzServiceClient::connect(grpc_addr.clone()).await {
                Ok(client) => break client,
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Err(e) => panic!("Failed to connect gRPC client after 20 attempts: {}", e),
            }
        }
    };

    TestApp { http_address, grpc }
}
