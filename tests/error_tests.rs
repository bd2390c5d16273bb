// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

use axum::http::StatusCode;
use axum::response::IntoResponse;
use pe_yoga::error::{AppError, ErrorCode};
use pe_yoga::models::PlanTier;
use pe_yoga::services::stripe::{StripeApiError, StripeErrorKind};

fn stripe_error(kind: StripeErrorKind) -> AppError {
    AppError::Stripe(StripeApiError {
        kind,
        message: "stripe said no".to_string(),
        code: None,
    })
}

#[test]
fn test_stripe_errors_map_by_kind() {
    assert_eq!(stripe_error(StripeErrorKind::Card).code(), ErrorCode::CardError);
    assert_eq!(
        stripe_error(StripeErrorKind::Card).status(),
        StatusCode::PAYMENT_REQUIRED
    );
    assert_eq!(
        stripe_error(StripeErrorKind::InvalidRequest).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        stripe_error(StripeErrorKind::Api).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        stripe_error(StripeErrorKind::Network).code(),
        ErrorCode::StripeError
    );
}

#[test]
fn test_billing_and_access_statuses() {
    assert_eq!(
        AppError::InvalidTier("platinum".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::NoBillingAccount.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::InvalidSignature("mismatch".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        AppError::TierRequired {
            required: PlanTier::Gold
        }
        .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(AppError::EmailInUse.status(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::VimeoApi("HTTP 503".to_string()).status(),
        StatusCode::BAD_GATEWAY
    );
}

#[tokio::test]
async fn test_internal_errors_do_not_leak_details() {
    let response =
        AppError::Database("connection reset by peer at 10.0.0.7".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["errorCode"], "DATABASE_ERROR");
    assert_eq!(json["error"], "Database error");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn test_json_rejection_becomes_bad_request() {
    use axum::extract::FromRequest;
    use axum::Json;

    let request = axum::http::Request::builder()
        .method("POST")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let rejection = Json::<serde_json::Value>::from_request(request, &())
        .await
        .unwrap_err();

    let err = AppError::from(rejection);
    assert_eq!(err.code(), ErrorCode::BadRequest);
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}
