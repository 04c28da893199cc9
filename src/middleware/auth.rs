// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential verification middleware and the authenticated-user extractor.
//!
//! [`attach_identity`] runs on every request and only records what the
//! presented credential resolved to. Handlers that need a user take an
//! [`AuthUser`] argument, which sends anonymous callers to the login page.

use crate::error::AppError;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

/// Token lifetime: 7 days.
pub const TOKEN_TTL_SECS: usize = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Provider identity
    pub google_id: String,
    /// Local user id
    #[serde(rename = "_id")]
    pub user_id: String,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Why a request carries no acting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("no credential presented")]
    NoCredential,
    /// Bad signature, expired, malformed, or unknown session.
    #[error("invalid credential")]
    InvalidCredential,
}

/// Acting identity of a request.
///
/// Taken from the credential as-is; it is not re-checked against the
/// directory, so it can describe a user whose record has since changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub google_id: String,
    pub display_name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            google_id: claims.google_id,
            display_name: claims.display_name,
        }
    }
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            google_id: user.google_id.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// Outcome of credential verification, stored in request extensions.
#[derive(Debug, Clone)]
pub struct Verified(pub Result<AuthUser, CredentialError>);

/// Middleware that resolves the presented credential, if any.
///
/// Never rejects: protected handlers decide for themselves via [`AuthUser`].
pub async fn attach_identity(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = state.credentials.verify(&jar);

    if let Err(CredentialError::InvalidCredential) = outcome {
        tracing::debug!(path = %request.uri().path(), "Rejected presented credential");
    }

    request.extensions_mut().insert(Verified(outcome));
    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Verified>() {
            Some(Verified(Ok(user))) => Ok(user.clone()),
            _ => Err(AppError::Unauthorized),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(match parts.extensions.get::<Verified>() {
            Some(Verified(Ok(user))) => Some(user.clone()),
            _ => None,
        })
    }
}

/// Create a JWT credential for a user.
pub fn create_jwt(user: &User, signing_key: &[u8]) -> anyhow::Result<String> {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    create_jwt_at(user, signing_key, now)
}

/// Create a JWT as if issued at `iat`.
pub fn create_jwt_at(user: &User, signing_key: &[u8], iat: usize) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        display_name: user.display_name.clone(),
        google_id: user.google_id.clone(),
        user_id: user.id.clone(),
        iat,
        exp: iat + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Check signature and expiry of a JWT credential.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, CredentialError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| CredentialError::InvalidCredential)
}
