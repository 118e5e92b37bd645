// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use natty_fit::config::Config;
use natty_fit::db::{Database, MemoryStore};
use natty_fit::routes::create_router;
use natty_fit::services::ObjectStore;
use natty_fit::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const MULTIPART_BOUNDARY: &str = "natty-fit-test-boundary";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::connect_firestore("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// In-memory object store with a fixed public base.
#[allow(dead_code)]
pub fn test_storage() -> ObjectStore {
    ObjectStore::memory("http://localhost:8080/objects", "nattypost")
}

/// Create a test app backed by in-memory stores.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(Database::new_memory(), test_storage())
}

/// Create a test app on top of the given stores.
#[allow(dead_code)]
pub fn create_test_app_with(db: Database, storage: ObjectStore) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(Config::default(), db, storage));
    (create_router(state.clone()), state)
}

/// Test app configured as a production deployment (Secure cookies).
#[allow(dead_code)]
pub fn create_production_app() -> (Router, Arc<AppState>) {
    let config = Config {
        production: true,
        frontend_url: "https://nattyfit.example.com".to_string(),
        ..Config::default()
    };
    let state = Arc::new(AppState::new(config, Database::new_memory(), test_storage()));
    (create_router(state.clone()), state)
}

/// Test app whose memory store is also returned for direct inspection.
#[allow(dead_code)]
pub fn create_test_app_with_store() -> (Router, Arc<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let (app, state) = create_test_app_with(Database::from_memory(store.clone()), test_storage());
    (app, state, store)
}

/// Build a JSON request, optionally carrying a `Cookie` header.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a body-less request, optionally carrying a `Cookie` header.
#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Build a multipart upload with a single `file` field.
#[allow(dead_code)]
pub fn multipart_request(
    uri: &str,
    file_name: &str,
    content_type: &str,
    bytes: &[u8],
    cookie: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    let mut builder = Request::builder().method("POST").uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Send a request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// All `Set-Cookie` header values of a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// The `token=...` pair from a response's `Set-Cookie`, usable as a `Cookie` header.
#[allow(dead_code)]
pub fn session_cookie(response: &Response) -> String {
    let headers = set_cookie_headers(response);
    let value = headers
        .iter()
        .find(|value| value.starts_with("token="))
        .unwrap_or_else(|| panic!("missing Set-Cookie header for token: {headers:?}"));
    value.split(';').next().unwrap().to_string()
}

/// Register an account and log in. Returns the session cookie and user id.
#[allow(dead_code)]
pub async fn register_and_login(app: &Router, name: &str, email: &str, password: &str) -> (String, String) {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({ "name": name, "email": email, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user_id = body_json(response).await["user"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "email": email, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    (session_cookie(&response), user_id)
}
