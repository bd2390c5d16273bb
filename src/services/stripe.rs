// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Stripe API client for customers, hosted checkout and the billing portal.
//!
//! Requests are form-encoded and authenticated with the secret key.
//! Error responses are classified by Stripe's `error.type`.

use serde::Deserialize;

/// Stripe error classes we distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeErrorKind {
    /// `card_error`: the customer's card was declined
    Card,
    /// `invalid_request_error`: bad parameters
    InvalidRequest,
    /// Any other API error
    Api,
    /// Request never produced a Stripe response
    Network,
}

/// Error returned by the Stripe API.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StripeApiError {
    pub kind: StripeErrorKind,
    pub message: String,
    /// Stripe's machine code, e.g. `card_declined`
    pub code: Option<String>,
}

impl StripeApiError {
    fn network(err: reqwest::Error) -> Self {
        Self {
            kind: StripeErrorKind::Network,
            message: err.to_string(),
            code: None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

/// Stripe customer (only the fields we use).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

/// Hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// Billing portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

/// Subscription as returned by `GET /v1/subscriptions/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Parameters for a subscription checkout.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    pub customer_id: &'a str,
    pub price_id: &'a str,
    pub user_id: &'a str,
    pub tier: &'a str,
    pub success_url: String,
    pub cancel_url: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    /// Create a client for the given API base (normally `https://api.stripe.com`).
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    /// Create a customer tagged with our user ID.
    pub async fn create_customer(
        &self,
        email: &str,
        name: &str,
        user_id: &str,
    ) -> Result<StripeCustomer, StripeApiError> {
        self.post_form(
            "/v1/customers",
            &[
                ("email", email),
                ("name", name),
                ("metadata[userId]", user_id),
            ],
        )
        .await
    }

    /// Start a hosted subscription checkout.
    ///
    /// No idempotency key is sent; a client retry creates a second session.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<CheckoutSession, StripeApiError> {
        self.post_form(
            "/v1/checkout/sessions",
            &[
                ("mode", "subscription"),
                ("customer", params.customer_id),
                ("line_items[0][price]", params.price_id),
                ("line_items[0][quantity]", "1"),
                ("success_url", params.success_url.as_str()),
                ("cancel_url", params.cancel_url.as_str()),
                ("metadata[userId]", params.user_id),
                ("metadata[tier]", params.tier),
                ("subscription_data[metadata][userId]", params.user_id),
                ("subscription_data[metadata][tier]", params.tier),
            ],
        )
        .await
    }

    /// Open a billing portal session for an existing customer.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, StripeApiError> {
        self.post_form(
            "/v1/billing_portal/sessions",
            &[("customer", customer_id), ("return_url", return_url)],
        )
        .await
    }

    /// Fetch a subscription.
    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<StripeSubscription, StripeApiError> {
        let url = format!(
            "{}/v1/subscriptions/{}",
            self.base_url,
            urlencoding::encode(subscription_id)
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(StripeApiError::network)?;

        self.check_response_json(response).await
    }

    /// Generic form POST with JSON response.
    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, StripeApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(StripeApiError::network)?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        response.json().await.map_err(|e| StripeApiError {
            kind: StripeErrorKind::Api,
            message: format!("JSON parse error: {}", e),
            code: None,
        })
    }
}

/// Turn a non-2xx Stripe response into a typed error.
fn classify_error(status: u16, body: &str) -> StripeApiError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return StripeApiError {
            kind: StripeErrorKind::Api,
            message: format!("HTTP {}: {}", status, body),
            code: None,
        };
    };

    let kind = match envelope.error.error_type.as_deref() {
        Some("card_error") => StripeErrorKind::Card,
        Some("invalid_request_error") => StripeErrorKind::InvalidRequest,
        _ => StripeErrorKind::Api,
    };

    StripeApiError {
        kind,
        message: envelope
            .error
            .message
            .unwrap_or_else(|| format!("HTTP {}", status)),
        code: envelope.error.code,
    }
}
