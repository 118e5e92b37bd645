// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Register / login / me / logout tests against the in-memory store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use std::time::{Duration, Instant};

mod common;
use common::{body_json, empty_request, json_request, send, set_cookie_headers};

#[tokio::test]
async fn test_register_login_me_logout() {
    let (app, _) = common::create_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Alice", "email": "Alice@Example.com ", "password": "Passw0rd" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("passwordHash").is_none());
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "Passw0rd" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let token_cookie = set_cookie_headers(&response)
        .into_iter()
        .find(|c| c.starts_with("token="))
        .unwrap();
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=604800"));
    // Test config is not production
    assert!(!token_cookie.contains("Secure"));

    let cookie = common::session_cookie(&response);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert!(body["expiresAt"].as_str().unwrap().ends_with('Z'));

    let response = send(&app, empty_request("GET", "/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("role").is_none());

    let response = send(&app, empty_request("POST", "/api/auth/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = set_cookie_headers(&response)
        .into_iter()
        .find(|c| c.starts_with("token="))
        .unwrap();
    assert!(cleared.starts_with("token=;"));
    assert!(cleared.contains("Max-Age=0"));
    assert!(cleared.contains("HttpOnly"));
    assert!(cleared.contains("Path=/"));
    assert!(cleared.contains("SameSite=Lax"));
    assert!(cleared.contains("1970"));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    // The old token is revoked, so replaying it fails
    let response = send(&app, empty_request("GET", "/api/auth/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let (app, _) = common::create_test_app();

    let response = send(&app, empty_request("POST", "/api/auth/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie_headers(&response)
        .iter()
        .any(|c| c.starts_with("token=;") && c.contains("Max-Age=0")));

    let response = send(
        &app,
        empty_request("POST", "/api/auth/logout", Some("token=garbage")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict_case_insensitive() {
    let (app, _) = common::create_test_app();
    common::register_and_login(&app, "Alice", "alice@example.com", "Passw0rd").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Other", "email": "ALICE@example.COM", "password": "Other123" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "conflict");
}

#[tokio::test]
async fn test_invalid_credentials_are_indistinguishable() {
    let (app, _) = common::create_test_app();
    common::register_and_login(&app, "Alice", "alice@example.com", "Passw0rd").await;

    let wrong_password = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "alice@example.com", "password": "Wrong1234" }),
            None,
        ),
    )
    .await;
    let unknown_email = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "nobody@example.com", "password": "Passw0rd" }),
            None,
        ),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_headers(&wrong_password).is_empty());

    let a = body_json(wrong_password).await;
    let b = body_json(unknown_email).await;
    assert_eq!(a, b);
    assert_eq!(a["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_unknown_email_pays_for_password_check() {
    let (app, _) = common::create_test_app();
    common::register_and_login(&app, "Alice", "alice@example.com", "Passw0rd").await;

    async fn timed_login(app: &axum::Router, email: &str) -> Duration {
        let start = Instant::now();
        let response = send(
            app,
            json_request(
                "POST",
                "/api/auth/login",
                json!({ "email": email, "password": "Wrong1234" }),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        start.elapsed()
    }

    // Warm the dummy hash so its one-time construction is not measured
    timed_login(&app, "nobody@example.com").await;

    let wrong_password = timed_login(&app, "alice@example.com").await;
    let unknown_email = timed_login(&app, "nobody@example.com").await;

    // Both paths run one Argon2 verification; skipping it is orders of magnitude faster
    assert!(
        unknown_email * 4 >= wrong_password,
        "unknown={unknown_email:?} wrong_password={wrong_password:?}"
    );
}

#[tokio::test]
async fn test_register_validation() {
    let (app, _) = common::create_test_app();

    let cases = [
        json!({ "name": "", "email": "a@example.com", "password": "Passw0rd" }),
        json!({ "name": "A", "email": "not-an-email", "password": "Passw0rd" }),
        json!({ "name": "A", "email": "a@example.com", "password": "short1" }),
        json!({ "name": "A", "email": "a@example.com", "password": "NoDigitsHere" }),
    ];

    for case in cases {
        let response = send(
            &app,
            json_request("POST", "/api/auth/register", case.clone(), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case: {case}");
        assert_eq!(body_json(response).await["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_unreadable_json_bodies_are_validation_errors() {
    let (app, _) = common::create_test_app();

    // Missing field
    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "email": "a@example.com", "password": "Passw0rd" }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_str().unwrap().contains("name"));

    // Malformed JSON
    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");

    // Wrong content type
    let response = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from(
                json!({ "name": "A", "email": "a@example.com", "password": "Passw0rd" })
                    .to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_profile_save_with_bad_body_is_validation_error() {
    let (app, _) = common::create_test_app();
    let (cookie, _) =
        common::register_and_login(&app, "Alice", "alice@example.com", "Passw0rd").await;

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/profile",
            json!({ "userId": 42, "name": "Alice" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn test_register_keeps_fitness_data() {
    let (app, state) = common::create_test_app();

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            json!({
                "name": "Bob",
                "email": "bob@example.com",
                "password": "Passw0rd",
                "fitnessData": { "heightCm": 180.0, "goal": "strength" }
            }),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = state
        .db
        .get_user_by_email("bob@example.com")
        .await
        .unwrap()
        .unwrap();
    let fitness = user.fitness.unwrap();
    assert_eq!(fitness.height_cm, Some(180.0));
    assert_eq!(fitness.goal.as_deref(), Some("strength"));
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_login_requires_fields() {
    let (app, _) = common::create_test_app();

    let response = send(
        &app,
        json_request("POST", "/api/auth/login", json!({ "email": "a@example.com" }), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
