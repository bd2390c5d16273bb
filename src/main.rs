// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! PE Yoga API Server
//!
//! Accounts, Stripe subscriptions and the tier-gated video library.

use pe_yoga::{
    config::Config,
    db::FirestoreDb,
    services::{Mailer, StripeClient, VideoCatalog, VimeoClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting PE Yoga API");

    if config.jwt_secret.is_none() {
        tracing::warn!("JWT_SECRET not set, session endpoints will fail");
    }

    // Connect to Firestore once; the handle is shared by all requests
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    tracing::info!(path = %config.video_catalog_path, "Loading video catalog");
    let catalog = VideoCatalog::load_from_file(&config.video_catalog_path)?;

    let stripe = StripeClient::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    );
    let vimeo = VimeoClient::new(
        config.vimeo.access_token.clone(),
        config.vimeo.api_base.clone(),
    );
    let mailer = Mailer::from_config(config.smtp.as_ref())?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        catalog,
        stripe,
        vimeo,
        mailer,
    });

    // Build router
    let app = pe_yoga::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pe_yoga=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
