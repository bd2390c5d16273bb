// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use pe_yoga::config::Config;
use pe_yoga::db::FirestoreDb;
use pe_yoga::middleware::auth::create_jwt;
use pe_yoga::models::{PlanTier, Subscription, SubscriptionStatus, User};
use pe_yoga::routes::create_router;
use pe_yoga::services::password::hash_password;
use pe_yoga::services::webhook::sign_payload;
use pe_yoga::services::{Mailer, StripeClient, VideoCatalog, VimeoClient};
use pe_yoga::time_utils::{now_rfc3339, unix_now};
use pe_yoga::AppState;
use std::sync::{Arc, Mutex};

/// Password used for every seeded account.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse battery";

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
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app with offline dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default())
}

/// Create a test app from a specific config (e.g. pointing at a fake API).
#[allow(dead_code)]
pub fn create_test_app_with(config: Config) -> (axum::Router, Arc<AppState>) {
    let catalog =
        VideoCatalog::load_from_file("data/videos.json").expect("Failed to load video catalog");
    let stripe = StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    );
    let vimeo = VimeoClient::new(
        config.vimeo.access_token.clone(),
        config.vimeo.api_base.clone(),
    );
    let mailer = Mailer::from_config(config.smtp.as_ref()).expect("Failed to build mailer");

    let state = Arc::new(AppState {
        config,
        db: FirestoreDb::new_in_memory(),
        catalog,
        stripe,
        vimeo,
        mailer,
    });

    (create_router(state.clone()), state)
}

/// Insert a user with the given plan. Paid plans are active.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, email: &str, plan: PlanTier) -> User {
    let status = if plan == PlanTier::Bronze {
        SubscriptionStatus::Inactive
    } else {
        SubscriptionStatus::Active
    };
    let now = now_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        name: "Test Teacher".to_string(),
        subscription: Subscription {
            status,
            plan,
            ..Default::default()
        },
        created_at: now.clone(),
        updated_at: now,
        reset_token_hash: None,
        reset_token_expires_at: None,
    };
    state.db.create_user(&user).await.unwrap();
    user
}

/// Session token for a seeded user.
#[allow(dead_code)]
pub fn token_for(state: &AppState, user: &User) -> String {
    create_jwt(user, state.config.jwt_secret.as_deref().unwrap()).unwrap()
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Webhook request signed with the test secret.
#[allow(dead_code)]
pub fn signed_webhook(payload: &serde_json::Value, secret: &str) -> Request<Body> {
    let body = payload.to_string();
    let signature = sign_payload(body.as_bytes(), secret, unix_now()).unwrap();
    Request::builder()
        .method(Method::POST)
        .uri("/api/stripe/webhooks")
        .header("stripe-signature", signature)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Requests seen by a [`FakeApi`], as `"METHOD path"`.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Local stand-in for the Stripe and Vimeo APIs.
#[allow(dead_code)]
pub struct FakeApi {
    pub base_url: String,
    pub calls: CallLog,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }
}

/// Start the fake API on an ephemeral port.
///
/// Checkout with price `price_declined` answers with a Stripe `card_error`.
#[allow(dead_code)]
pub async fn spawn_fake_api() -> FakeApi {
    use axum::extract::{Form, Path};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::Json;
    use serde_json::json;
    use std::collections::HashMap;

    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

    let log = |calls: &CallLog, entry: &str| calls.lock().unwrap().push(entry.to_string());

    let c = calls.clone();
    let customers = post(move |Form(form): Form<HashMap<String, String>>| async move {
        log(&c, "POST /v1/customers");
        Json(json!({
            "id": "cus_fake_1",
            "email": form.get("email"),
        }))
    });

    let c = calls.clone();
    let checkout = post(move |Form(form): Form<HashMap<String, String>>| async move {
        log(&c, "POST /v1/checkout/sessions");
        if form.get("line_items[0][price]").map(String::as_str) == Some("price_declined") {
            return (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({"error": {
                    "type": "card_error",
                    "code": "card_declined",
                    "message": "Your card was declined."
                }})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "id": "cs_test_1",
                "url": "https://checkout.stripe.test/c/cs_test_1",
                "customer": form.get("customer"),
                "success_url": form.get("success_url"),
                "metadata": {"tier": form.get("metadata[tier]")},
            })),
        )
    });

    let c = calls.clone();
    let portal = post(move || async move {
        log(&c, "POST /v1/billing_portal/sessions");
        Json(json!({"url": "https://billing.stripe.test/p/session_1"}))
    });

    let c = calls.clone();
    let subscription = get(move |Path(id): Path<String>| async move {
        log(&c, "GET /v1/subscriptions");
        Json(json!({
            "id": id,
            "status": "active",
            "current_period_end": 1_800_000_000,
            "cancel_at_period_end": false
        }))
    });

    let c = calls.clone();
    let vimeo = get(move || async move {
        log(&c, "GET /me/videos");
        Json(json!({
            "total": 1,
            "page": 1,
            "per_page": 10,
            "data": [{
                "uri": "/videos/812340011",
                "name": "Sun Salutation Basics",
                "description": "Gentle warm-up",
                "duration": 480,
                "link": "https://vimeo.com/812340011",
                "pictures": {"sizes": [
                    {"width": 295, "link": "https://i.vimeocdn.com/295.jpg"},
                    {"width": 640, "link": "https://i.vimeocdn.com/640.jpg"}
                ]}
            }]
        }))
    });

    let app = axum::Router::new()
        .route("/v1/customers", customers)
        .route("/v1/checkout/sessions", checkout)
        .route("/v1/billing_portal/sessions", portal)
        .route("/v1/subscriptions/{id}", subscription)
        .route("/me/videos", vimeo);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeApi {
        base_url: format!("http://{}", addr),
        calls,
    }
}

/// Test config with Stripe and Vimeo pointed at a fake API.
#[allow(dead_code)]
pub fn config_for(fake: &FakeApi) -> Config {
    let mut config = Config::test_default();
    config.stripe_api_base = fake.base_url.clone();
    config.vimeo.api_base = fake.base_url.clone();
    config.vimeo.access_token = Some("vimeo_test_token".to_string());
    config
}
