// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Stripe routes: checkout, billing portal, webhooks and public config.

use axum::{
    body::Bytes,
    extract::{Extension, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::PlanTier;
use crate::services::stripe::CheckoutParams;
use crate::services::subscriptions::{EventOutcome, SubscriptionSync};
use crate::services::webhook::{verify_signature, StripeEvent};
use crate::time_utils::{now_rfc3339, unix_now};
use crate::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// Public Stripe routes (the webhook authenticates by signature).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stripe/webhooks", post(webhook))
        .route("/api/stripe/config", get(stripe_config))
}

/// Billing routes that need a session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/stripe/create-checkout-session",
            post(create_checkout_session),
        )
        .route("/api/stripe/create-portal-session", post(create_portal_session))
}

/// Checkout body. `tier` stays loose so a missing or non-string value is an invalid tier.
#[derive(Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub tier: Option<serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct PortalResponse {
    pub url: String,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfigResponse {
    pub publishable_key: Option<String>,
}

/// Start a hosted checkout for a paid tier.
async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    WithRejection(Json(request), _): WithRejection<Json<CheckoutRequest>, AppError>,
) -> Result<Json<CheckoutResponse>> {
    let raw = match &request.tier {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => return Err(AppError::InvalidTier(other.to_string())),
        None => return Err(AppError::InvalidTier("missing".to_string())),
    };
    let tier = PlanTier::parse(&raw)
        .filter(|t| t.is_purchasable())
        .ok_or_else(|| AppError::InvalidTier(raw.clone()))?;
    let price_id = state
        .config
        .price_id_for(tier)
        .ok_or_else(|| AppError::InvalidTier(raw.clone()))?;

    let mut user = state
        .db
        .get_user(&auth_user.id())
        .await?
        .ok_or(AppError::UserNotFound)?;

    let customer_id = match user.subscription.stripe_customer_id.clone() {
        Some(id) => id,
        None => {
            let customer = state
                .stripe
                .create_customer(&user.email, &user.name, &user.id)
                .await?;
            tracing::info!(user_id = %user.id, customer_id = %customer.id, "Created Stripe customer");

            user.subscription.stripe_customer_id = Some(customer.id.clone());
            user.updated_at = now_rfc3339();
            state.db.update_user(&user).await?;
            customer.id
        }
    };

    let session = state
        .stripe
        .create_checkout_session(&CheckoutParams {
            customer_id: &customer_id,
            price_id,
            user_id: &user.id,
            tier: tier.as_str(),
            success_url: format!(
                "{}/dashboard?session_id={{CHECKOUT_SESSION_ID}}",
                state.config.base_url
            ),
            cancel_url: format!("{}/pricing", state.config.base_url),
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        tier = %tier,
        session_id = %session.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
    }))
}

/// Open the billing portal for the caller's Stripe customer.
async fn create_portal_session(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<PortalResponse>> {
    let user = state
        .db
        .get_user(&auth_user.id())
        .await?
        .ok_or(AppError::UserNotFound)?;

    let customer_id = user
        .subscription
        .stripe_customer_id
        .as_deref()
        .ok_or(AppError::NoBillingAccount)?;

    let return_url = format!("{}/dashboard", state.config.base_url);
    let session = state
        .stripe
        .create_portal_session(customer_id, &return_url)
        .await?;

    Ok(Json(PortalResponse { url: session.url }))
}

/// Receive a Stripe event.
///
/// The signature is checked against the raw body before anything else runs.
/// Once verified the event is acknowledged even if applying it fails.
async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok());

    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        unix_now(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Security Alert: Stripe webhook signature rejected");
        AppError::InvalidSignature(e.to_string())
    })?;

    let event: StripeEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse Stripe event");
        AppError::BadRequest(format!("Invalid event payload: {}", e))
    })?;

    tracing::info!(
        event_id = ?event.id,
        event_type = %event.event_type,
        "Stripe webhook received"
    );

    let sync = SubscriptionSync::new(&state.db, &state.stripe, &state.config);
    match sync.handle_event(&event).await {
        Ok(EventOutcome::Updated { user_id }) => {
            tracing::info!(event_type = %event.event_type, user_id = %user_id, "Stripe event applied");
        }
        Ok(outcome) => {
            tracing::debug!(event_type = %event.event_type, outcome = ?outcome, "Stripe event not applied");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                event_type = %event.event_type,
                event_id = ?event.id,
                "Failed to handle Stripe event"
            );
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

async fn stripe_config(State(state): State<Arc<AppState>>) -> Json<StripeConfigResponse> {
    Json(StripeConfigResponse {
        publishable_key: state.config.stripe_publishable_key.clone(),
    })
}
