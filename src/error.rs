// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Application error types with consistent API responses.
//!
//! Every error maps to one [`ErrorCode`]; the code alone decides the HTTP status.

use crate::models::PlanTier;
use crate::services::stripe::{StripeApiError, StripeErrorKind};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Machine-readable error codes returned as `errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TokenMissing,
    TokenInvalid,
    TokenExpired,
    UserNotFound,
    InvalidUserId,
    ServerConfigError,
    InvalidCredentials,
    EmailInUse,
    ValidationError,
    ResetTokenInvalid,
    InvalidTier,
    NoBillingAccount,
    InvalidSignature,
    CardError,
    StripeInvalidRequest,
    StripeError,
    TierRequired,
    NotFound,
    BadRequest,
    VimeoError,
    SmtpError,
    DatabaseError,
    InternalError,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub const fn status(self) -> StatusCode {
        match self {
            ErrorCode::TokenMissing | ErrorCode::TokenExpired | ErrorCode::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ErrorCode::TokenInvalid | ErrorCode::TierRequired => StatusCode::FORBIDDEN,
            ErrorCode::UserNotFound | ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidUserId
            | ErrorCode::ValidationError
            | ErrorCode::ResetTokenInvalid
            | ErrorCode::InvalidTier
            | ErrorCode::NoBillingAccount
            | ErrorCode::InvalidSignature
            | ErrorCode::StripeInvalidRequest
            | ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::EmailInUse => StatusCode::CONFLICT,
            ErrorCode::CardError => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::VimeoError | ErrorCode::SmtpError => StatusCode::BAD_GATEWAY,
            ErrorCode::ServerConfigError
            | ErrorCode::StripeError
            | ErrorCode::DatabaseError
            | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    TokenMissing,

    #[error("Session expired")]
    TokenExpired,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Server misconfigured: {0} is not set")]
    Misconfigured(&'static str),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email address is already registered")]
    EmailInUse,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Reset link is invalid or has expired")]
    ResetTokenInvalid,

    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    #[error("No billing account for this user")]
    NoBillingAccount,

    #[error("Webhook signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("Stripe error: {0}")]
    Stripe(#[from] StripeApiError),

    #[error("This video requires the {required} plan")]
    TierRequired { required: PlanTier },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Vimeo API error: {0}")]
    VimeoApi(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::TokenMissing => ErrorCode::TokenMissing,
            AppError::TokenExpired => ErrorCode::TokenExpired,
            AppError::InvalidToken => ErrorCode::TokenInvalid,
            AppError::UserNotFound => ErrorCode::UserNotFound,
            AppError::InvalidUserId(_) => ErrorCode::InvalidUserId,
            AppError::Misconfigured(_) => ErrorCode::ServerConfigError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::EmailInUse => ErrorCode::EmailInUse,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::ResetTokenInvalid => ErrorCode::ResetTokenInvalid,
            AppError::InvalidTier(_) => ErrorCode::InvalidTier,
            AppError::NoBillingAccount => ErrorCode::NoBillingAccount,
            AppError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            AppError::Stripe(err) => match err.kind {
                StripeErrorKind::Card => ErrorCode::CardError,
                StripeErrorKind::InvalidRequest => ErrorCode::StripeInvalidRequest,
                StripeErrorKind::Api | StripeErrorKind::Network => ErrorCode::StripeError,
            },
            AppError::TierRequired { .. } => ErrorCode::TierRequired,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::VimeoApi(_) => ErrorCode::VimeoError,
            AppError::Smtp(_) => ErrorCode::SmtpError,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// JSON error response body
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (error, details) = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                ("Database error".to_string(), None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                ("Internal server error".to_string(), None)
            }
            AppError::Misconfigured(var) => {
                tracing::error!(variable = var, "Server configuration error");
                ("Server configuration error".to_string(), None)
            }
            AppError::Stripe(err) => {
                tracing::warn!(
                    kind = ?err.kind,
                    code = ?err.code,
                    message = %err.message,
                    "Stripe request failed"
                );
                (self.to_string(), err.code.clone())
            }
            AppError::VimeoApi(msg) | AppError::Smtp(msg) => {
                tracing::warn!(error = %msg, code = ?code, "Upstream service error");
                (self.to_string(), None)
            }
            AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Validation(msg) => {
                (self.to_string(), Some(msg.clone()))
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error,
            error_code: code,
            details,
        };

        (code.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
