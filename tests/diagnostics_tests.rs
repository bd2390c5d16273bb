// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Health, SMTP check, Vimeo proxy, and response headers.

use axum::http::{header, Method, StatusCode};
use pe_yoga::models::PlanTier;
use tower::ServiceExt;

mod common;
use common::{
    body_json, config_for, create_test_app, create_test_app_with, request, seed_user,
    spawn_fake_api, token_for,
};

#[tokio::test]
async fn test_health() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["buildId"].is_string());
}

#[tokio::test]
async fn test_smtp_check_without_config() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(request(Method::GET, "/api/test/smtp", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["errorCode"], "SERVER_CONFIG_ERROR");
}

#[tokio::test]
async fn test_smtp_check_unreachable_relay() {
    let mut config = pe_yoga::config::Config::test_default();
    config.smtp = Some(pe_yoga::config::SmtpConfig {
        host: "localhost".to_string(),
        port: 9,
        username: None,
        password: None,
        from: "PE Yoga <no-reply@example.com>".to_string(),
    });
    let (app, _state) = create_test_app_with(config);

    let response = app
        .oneshot(request(Method::GET, "/api/test/smtp", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["errorCode"], "SMTP_ERROR");
}

#[tokio::test]
async fn test_vimeo_proxy() {
    let fake = spawn_fake_api().await;
    let (app, state) = create_test_app_with(config_for(&fake));
    let user = seed_user(&state, "teacher@example.com", PlanTier::Bronze).await;

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/vimeo?page=1&per_page=500",
            Some(&token_for(&state, &user)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["perPage"], 100);
    assert_eq!(body["videos"][0]["vimeoId"], "812340011");
    assert_eq!(body["videos"][0]["thumbnail"], "https://i.vimeocdn.com/640.jpg");
    assert_eq!(fake.count("GET /me/videos"), 1);
}

#[tokio::test]
async fn test_vimeo_proxy_without_token_configured() {
    let (app, state) = create_test_app();
    let user = seed_user(&state, "teacher@example.com", PlanTier::Bronze).await;

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/vimeo",
            Some(&token_for(&state, &user)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["errorCode"], "SERVER_CONFIG_ERROR");
}

#[tokio::test]
async fn test_vimeo_proxy_upstream_failure() {
    let mut config = pe_yoga::config::Config::test_default();
    config.vimeo.access_token = Some("vimeo_test_token".to_string());
    let (app, state) = create_test_app_with(config);
    let user = seed_user(&state, "teacher@example.com", PlanTier::Bronze).await;

    let response = app
        .oneshot(request(
            Method::GET,
            "/api/vimeo",
            Some(&token_for(&state, &user)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["errorCode"], "VIMEO_ERROR");
}

#[tokio::test]
async fn test_vimeo_proxy_requires_session() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(request(Method::GET, "/api/vimeo", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight_allows_localhost() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/stripe/create-checkout-session")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_rejects_lookalike_origin() {
    let (app, _state) = create_test_app();

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/stripe/create-checkout-session")
                .header(header::ORIGIN, "http://localhost.attacker.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
}
