// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login routes.
//!
//! `/login/google` sends the browser to Google with a signed `state` and
//! drops a matching nonce cookie scoped to the callback path. The callback
//! accepts the grant only if both agree, then resolves the user and issues
//! the application credential.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

pub const CALLBACK_PATH: &str = "/login/google/return";
const NONCE_COOKIE: &str = "oauth_nonce";
/// Scopes requested from Google.
const SCOPES: &[&str] = &["profile"];
/// How long a login attempt may take between redirect and callback.
const STATE_TTL_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_page))
        .route("/login/google", get(auth_start))
        .route(CALLBACK_PATH, get(auth_callback))
        .route("/logout", get(logout))
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub login_url: &'static str,
}

/// Login entry point; unauthenticated callers are redirected here.
async fn login_page() -> Json<LoginResponse> {
    Json(LoginResponse {
        login_url: "/login/google",
    })
}

/// Start OAuth flow - redirect to Google authorization.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let mut raw = [0u8; 16];
    SystemRandom::new()
        .fill(&mut raw)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    let nonce = hex::encode(raw);

    let oauth_state = sign_state(&nonce, now_millis()?, &state.config.oauth_state_key())
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("HMAC init failed")))?;

    let auth_url = state.provider.authorize_url(SCOPES, &oauth_state);

    tracing::info!(
        client_id = %state.config.google_client_id,
        "Starting OAuth flow, redirecting to Google"
    );

    let jar = jar.add(nonce_cookie(nonce, state.config.secure_cookies()));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - redeem the grant, resolve the user, issue a credential.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let browser_nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(nonce_cookie(String::new(), state.config.secure_cookies()));

    // Check for OAuth errors
    if let Some(error) = params.error {
        return Err(AppError::ProviderRejected(error));
    }

    let state_key = state.config.oauth_state_key();
    let now_ms = now_millis()?;
    let state_nonce = params
        .state
        .as_deref()
        .and_then(|s| verify_and_decode_state(s, &state_key, now_ms))
        .ok_or_else(|| AppError::ProviderRejected("invalid or expired state".to_string()))?;

    let nonce_matches = browser_nonce
        .map(|n| bool::from(n.as_bytes().ct_eq(state_nonce.as_bytes())))
        .unwrap_or(false);
    if !nonce_matches {
        return Err(AppError::ProviderRejected(
            "state was not issued to this browser".to_string(),
        ));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::ProviderRejected("missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for profile");
    let handshake = state.provider.complete_handshake(&code).await?;

    let user = state.db.lookup_or_create(&handshake.profile).await?;

    tracing::info!(
        user_id = %user.id,
        google_id = %user.google_id,
        "OAuth successful, issuing credential"
    );

    let jar = state.credentials.issue(jar, &user)?;
    Ok((jar, Redirect::to("/")))
}

/// Logout - drop the credential and go home.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    (state.credentials.revoke(jar), Redirect::to("/"))
}

fn nonce_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((NONCE_COOKIE, value))
        .path(CALLBACK_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.set_max_age(time::Duration::milliseconds(STATE_TTL_MS as i64));
    cookie
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Encode `nonce|timestamp_hex|signature_hex` as URL-safe base64.
fn sign_state(nonce: &str, timestamp_ms: u128, secret: &[u8]) -> Option<String> {
    let payload = format!("{}|{:x}", nonce, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    let signed_state = format!("{}|{}", payload, signature);
    Some(URL_SAFE_NO_PAD.encode(signed_state.as_bytes()))
}

/// Verify signature and age of the OAuth state parameter, returning its nonce.
fn verify_and_decode_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "nonce|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let nonce = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    let payload = format!("{}|{}", nonce, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected_signature.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > STATE_TTL_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(nonce.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"secret_key";
    const ISSUED: u128 = 1_780_000_000_000;

    #[test]
    fn test_verify_and_decode_state_success() {
        let state = sign_state("abc123", ISSUED, SECRET).unwrap();
        let result = verify_and_decode_state(&state, SECRET, ISSUED + 1000);
        assert_eq!(result, Some("abc123".to_string()));
    }

    #[test]
    fn test_verify_and_decode_state_invalid_signature() {
        let payload = format!("abc123|{:x}|invalid_signature", ISSUED);
        let encoded_state = URL_SAFE_NO_PAD.encode(payload.as_bytes());

        assert_eq!(verify_and_decode_state(&encoded_state, SECRET, ISSUED), None);
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let state = sign_state("abc123", ISSUED, SECRET).unwrap();
        assert_eq!(verify_and_decode_state(&state, b"wrong_key", ISSUED), None);
    }

    #[test]
    fn test_verify_and_decode_state_expired() {
        let state = sign_state("abc123", ISSUED, SECRET).unwrap();
        assert_eq!(
            verify_and_decode_state(&state, SECRET, ISSUED + STATE_TTL_MS + 1),
            None
        );
    }

    #[test]
    fn test_verify_and_decode_state_malformed() {
        let encoded_state = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_and_decode_state(&encoded_state, SECRET, ISSUED), None);
        assert_eq!(verify_and_decode_state("not base64!!", SECRET, ISSUED), None);
    }

    #[test]
    fn test_state_is_url_safe() {
        let state = sign_state("abc123", ISSUED, SECRET).unwrap();
        assert!(!state.contains('+'));
        assert!(!state.contains('/'));
        assert!(!state.contains('='));
    }
}
