// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent responses.
//!
//! Authentication failures never render a body: they send the caller back to
//! the login page. Every other failure renders `{status, message, type}`.

use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;

/// Where unauthenticated callers are sent.
pub const LOGIN_PATH: &str = "/login";

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No credential, or one that failed verification.
    #[error("Authentication required")]
    Unauthorized,

    /// The provider refused or the callback could not be tied to a login.
    #[error("Identity provider rejected the login: {0}")]
    ProviderRejected(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    /// Referenced user, friend or gift is absent.
    ///
    /// Reported as 500 with type `internal`; clients already depend on it.
    #[error("{0}")]
    NotFound(String),

    #[error("You cannot add yourself as a friend")]
    SelfFriendship,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl AppError {
    pub fn no_such_user() -> Self {
        AppError::NotFound("No such user".to_string())
    }

    pub fn no_such_friend() -> Self {
        AppError::NotFound("No such friend".to_string())
    }

    pub fn no_such_gift() -> Self {
        AppError::NotFound("No such gift".to_string())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Unauthorized => {
                return Redirect::to(LOGIN_PATH).into_response();
            }
            AppError::ProviderRejected(reason) => {
                tracing::warn!(reason = %reason, "Login rejected, back to login page");
                return Redirect::to(LOGIN_PATH).into_response();
            }
            AppError::Provider(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                (
                    StatusCode::BAD_GATEWAY,
                    "provider_error",
                    "Identity provider unavailable".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg.clone()),
            AppError::SelfFriendship => (StatusCode::BAD_REQUEST, "bad_request", self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            message,
            kind,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
