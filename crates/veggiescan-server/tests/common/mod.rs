#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;
use veggiescan_ai::ScanAnalyzer;
use veggiescan_server::app;
use veggiescan_server::auth::ensure_default_admin;
use veggiescan_server::config::ServerConfig;
use veggiescan_server::state::AppState;
use veggiescan_storage::VeggieStore;

pub const ADMIN_EMAIL: &str = "admin@veggiescan.local";
pub const ADMIN_PASSWORD: &str = "changeme";
pub const TEST_SECRET: &str = "test-secret";

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
}

impl TestContext {
    pub fn dataset_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("dataset")
    }
}

/// Mock-mode server: no vision model, scans answered by cache or mock.
pub async fn build_test_context() -> Result<TestContext> {
    build_test_context_with_analyzer(None).await
}

pub async fn build_test_context_with_analyzer(
    analyzer: Option<Arc<dyn ScanAnalyzer>>,
) -> Result<TestContext> {
    veggiescan_common::id::init(1, 1);

    let temp_dir = tempfile::tempdir()?;
    let mut config = ServerConfig::default();
    config.database.data_dir = temp_dir.path().to_string_lossy().to_string();
    config.scan.dataset_dir = temp_dir.path().join("dataset").to_string_lossy().to_string();
    config.ai.mock_mode = analyzer.is_none();
    config.auth.token_expire_secs = 3600;

    let store = Arc::new(
        VeggieStore::new(
            &config.database.connection_url(),
            temp_dir.path(),
        )
        .await?,
    );
    ensure_default_admin(&store, &config.auth).await?;

    let state = AppState::new(config, store, analyzer, TEST_SECRET.to_string());
    let app = app::build_http_app(state.clone());

    Ok(TestContext {
        temp_dir,
        state,
        app,
    })
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value, Option<String>) {
    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let trace_id = resp
        .headers()
        .get("x-trace-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, trace_id)
}

pub async fn request_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder = builder.header("Content-Type", "application/json");

    let req_body = body.unwrap_or(Value::Null).to_string();
    let req = builder
        .body(Body::from(req_body))
        .expect("request should build");
    send(app, req).await
}

pub async fn request_no_body(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = builder.body(Body::empty()).expect("request should build");
    send(app, req).await
}

const BOUNDARY: &str = "veggiescan-test-boundary";

/// Single-file multipart form
pub fn multipart_body(field: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"veg.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload_scan(
    app: &axum::Router,
    token: Option<&str>,
    field: &str,
    bytes: &[u8],
) -> (StatusCode, Value, Option<String>) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/scan")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = builder
        .body(Body::from(multipart_body(field, bytes)))
        .expect("request should build");
    send(app, req).await
}

pub async fn register_and_get_token(app: &axum::Router, email: &str) -> String {
    let (status, body, _) = request_json(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "username": email.split('@').next().unwrap_or("user"),
            "password": "password123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "register failed: {body}");
    assert_eq!(body["err_code"], 0);
    body["data"]["access_token"]
        .as_str()
        .expect("token should exist")
        .to_string()
}

pub async fn login_and_get_token(app: &axum::Router, email: &str, password: &str) -> String {
    let (status, body, _) = request_json(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    assert_eq!(body["err_code"], 0);
    body["data"]["access_token"]
        .as_str()
        .expect("token should exist")
        .to_string()
}

pub async fn admin_token(app: &axum::Router) -> String {
    login_and_get_token(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

pub fn assert_ok_envelope(json: &Value) {
    assert_eq!(json["err_code"], 0);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
}

pub fn assert_err_envelope(json: &Value, err_code: i32) {
    assert_eq!(json["err_code"], err_code);
    assert!(json["err_msg"].is_string());
    assert!(json.get("trace_id").is_some());
    assert!(json.get("data").is_some());
    assert!(json["data"].is_null());
}

pub fn decode_data<T: DeserializeOwned>(json: &Value) -> T {
    serde_json::from_value(json["data"].clone()).expect("data should decode")
}
