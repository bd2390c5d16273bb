// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! JWT session tokens and the authentication middleware.

use crate::error::AppError;
use crate::models::{Subscription, User};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Session lifetime.
pub const SESSION_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Subscription as of token issuance
    pub subscription: Subscription,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub subscription: Subscription,
}

impl AuthUser {
    pub fn id(&self) -> String {
        self.user_id.to_string()
    }
}

/// Signing secret, or a configuration error if unset.
pub fn signing_key(state: &AppState) -> Result<&[u8], AppError> {
    state
        .config
        .jwt_secret
        .as_deref()
        .ok_or(AppError::Misconfigured("JWT_SECRET"))
}

/// Pull the session token from the `Authorization: Bearer` header.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Verify a session token and resolve the user it names.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> Result<AuthUser, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })?;

    let user_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::InvalidUserId(token_data.claims.sub.clone()))?;

    Ok(AuthUser {
        user_id,
        email: token_data.claims.email,
        subscription: token_data.claims.subscription,
    })
}

/// Resolve the caller from request headers.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, AppError> {
    let key = signing_key(state)?;
    let token = extract_token(headers).ok_or(AppError::TokenMissing)?;
    decode_jwt(&token, key)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(&state, request.headers()).inspect_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Rejected unauthenticated request");
    })?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Create a JWT for a user session, embedding the current subscription.
pub fn create_jwt(user: &User, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        subscription: user.subscription.clone(),
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
