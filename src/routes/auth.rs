// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Account routes: registration, sign-in, session refresh and password reset.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, signing_key, AuthUser};
use crate::models::{normalize_email, Subscription, User};
use crate::services::password::{
    generate_reset_token, hash_password, hash_reset_token, verify_password,
};
use crate::time_utils::{now_rfc3339, unix_now};
use crate::AppState;

/// Reset links stay valid for one hour.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Public account routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/signin", post(signin))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

/// Account routes that need a session.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/auth/session", get(session))
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 256))]
    pub password: String,
}

/// User as returned to the frontend. Never includes credentials.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub subscription: Subscription,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            subscription: user.subscription.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn issue_token(state: &AppState, user: &User) -> Result<String> {
    let key = signing_key(state)?;
    Ok(create_jwt(user, key)?)
}

/// Hash on the blocking pool.
async fn hash_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Internal(e.into()))
}

async fn verify_blocking(password: String, encoded: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// Create an account on the free tier and sign it in.
async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    request.validate()?;
    // Fail before writing anything if sessions cannot be issued
    signing_key(&state)?;

    let email = normalize_email(&request.email);
    if state.db.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::EmailInUse);
    }

    let now = now_rfc3339();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash: hash_blocking(request.password).await?,
        name: request.name.trim().to_string(),
        subscription: Subscription::default(),
        created_at: now.clone(),
        updated_at: now,
        reset_token_hash: None,
        reset_token_expires_at: None,
    };

    // The email index makes this the authoritative uniqueness check
    state.db.create_user(&user).await?;
    tracing::info!(user_id = %user.id, "User registered");

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

async fn signin(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<SigninRequest>, AppError>,
) -> Result<Json<AuthResponse>> {
    request.validate()?;
    let key = signing_key(&state)?;

    let email = normalize_email(&request.email);
    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_blocking(request.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, "Sign-in rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = create_jwt(&user, key)?;
    tracing::info!(user_id = %user.id, "User signed in");

    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Current user, with a token re-issued from the stored subscription.
async fn session(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .db
        .get_user(&auth_user.id())
        .await?
        .ok_or(AppError::UserNotFound)?;

    if user.subscription != auth_user.subscription {
        tracing::debug!(user_id = %user.id, "Session token had a stale subscription");
    }

    let token = issue_token(&state, &user)?;
    Ok(Json(AuthResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<ForgotPasswordRequest>, AppError>,
) -> Result<Json<MessageResponse>> {
    const RESPONSE: MessageResponse = MessageResponse {
        message: "If that address has an account, a reset link is on its way.",
    };

    request.validate()?;

    let email = normalize_email(&request.email);
    let Some(mut user) = state.db.find_user_by_email(&email).await? else {
        tracing::debug!("Password reset requested for unknown email");
        return Ok(Json(RESPONSE));
    };

    let token = generate_reset_token().map_err(|e| AppError::Internal(e.into()))?;
    user.reset_token_hash = Some(hash_reset_token(&token));
    user.reset_token_expires_at = Some(unix_now() + RESET_TOKEN_TTL_SECS);
    user.updated_at = now_rfc3339();
    state.db.update_user(&user).await?;

    let link = format!(
        "{}/reset-password?token={}",
        state.config.base_url,
        urlencoding::encode(&token)
    );

    if let Err(e) = state
        .mailer
        .send_password_reset(&user.email, &user.name, &link)
        .await
    {
        tracing::error!(error = %e, user_id = %user.id, "Failed to send password reset email");
    }

    Ok(Json(RESPONSE))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<ResetPasswordRequest>, AppError>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    let token_hash = hash_reset_token(request.token.trim());
    let mut user = state
        .db
        .find_user_by_reset_token_hash(&token_hash)
        .await?
        .ok_or(AppError::ResetTokenInvalid)?;

    let expired = user
        .reset_token_expires_at
        .map_or(true, |expires_at| unix_now() > expires_at);
    if expired {
        tracing::info!(user_id = %user.id, "Expired password reset token presented");
        return Err(AppError::ResetTokenInvalid);
    }

    user.password_hash = hash_blocking(request.password).await?;
    user.reset_token_hash = None;
    user.reset_token_expires_at = None;
    user.updated_at = now_rfc3339();
    state.db.update_user(&user).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");
    Ok(Json(MessageResponse {
        message: "Password updated.",
    }))
}
