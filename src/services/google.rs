// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 client.
//!
//! Handles:
//! - Building the consent screen URL
//! - Exchanging an authorization code for tokens
//! - Fetching the OpenID userinfo profile

use crate::config::Config;
use crate::models::Photo;
use crate::services::provider::{Handshake, IdentityProvider, ProviderError, ProviderProfile};
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Google identity provider.
#[derive(Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl GoogleProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Google OAuth HTTP client")?;

        tracing::info!(
            client_id = %config.google_client_id,
            callback_url = %config.google_callback_url,
            "Initialized Google identity provider"
        );

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            callback_url: config.google_callback_url.clone(),
        })
    }

    /// Exchange authorization code for tokens (internal helper).
    async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, ProviderError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.callback_url.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("Token exchange failed: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            // invalid_grant and friends: the code is unusable, the user must start over
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Google rejected authorization code");
            return Err(ProviderError::Rejected(format!(
                "Token exchange refused with status {}",
                status
            )));
        }
        if !status.is_success() {
            tracing::error!(status = %status, "Google token exchange failed");
            return Err(ProviderError::Transient(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("Failed to parse token response: {}", e)))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, ProviderError> {
        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Transient(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Google userinfo request failed");
            return Err(ProviderError::Transient(format!(
                "Userinfo failed with status {}",
                status
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("Failed to parse userinfo: {}", e)))?;

        Ok(info.into_profile())
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, scopes: &[&str], state: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(&scopes.join(" ")),
            state
        )
    }

    async fn complete_handshake(&self, code: &str) -> Result<Handshake, ProviderError> {
        let tokens = self.exchange_code(code).await?;
        let profile = self.fetch_profile(&tokens.access_token).await?;

        tracing::info!(
            google_id = %profile.id,
            display_name = %profile.display_name,
            "Google handshake complete"
        );

        Ok(Handshake {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            profile,
        })
    }
}

/// Token exchange response from Google OAuth.
#[derive(Debug, Clone, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// OpenID Connect userinfo document.
#[derive(Debug, Clone, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl UserInfo {
    fn into_profile(self) -> ProviderProfile {
        let display_name = match (self.name, self.given_name, self.family_name) {
            (Some(name), _, _) if !name.is_empty() => name,
            (_, Some(given), Some(family)) => format!("{} {}", given, family),
            (_, Some(given), None) => given,
            (_, None, Some(family)) => family,
            _ => self.sub.clone(),
        };

        ProviderProfile {
            id: self.sub,
            display_name,
            photos: self
                .picture
                .into_iter()
                .map(|value| Photo { value })
                .collect(),
        }
    }
}
