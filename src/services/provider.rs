// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider port.
//!
//! Exactly one provider is wired in at a time. Handlers only ever see this
//! trait, so tests can swap in a fixture instead of talking to Google.

use crate::models::Photo;
use async_trait::async_trait;
use std::sync::Arc;

/// Profile confirmed by the provider at the end of a handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Stable provider identity
    pub id: String,
    pub display_name: String,
    pub photos: Vec<Photo>,
}

/// Everything the provider hands back for a redeemed grant.
#[derive(Debug, Clone)]
pub struct Handshake {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub profile: ProviderProfile,
}

/// Handshake failure categories.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the grant (denied, expired or replayed code).
    #[error("provider rejected the grant: {0}")]
    Rejected(String),
    /// The provider could not be reached or answered garbage.
    #[error("provider unavailable: {0}")]
    Transient(String),
}

impl From<ProviderError> for crate::error::AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Rejected(reason) => crate::error::AppError::ProviderRejected(reason),
            ProviderError::Transient(reason) => crate::error::AppError::Provider(reason),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to in order to start a login.
    fn authorize_url(&self, scopes: &[&str], state: &str) -> String;

    /// Redeem an authorization code for the user's profile.
    async fn complete_handshake(&self, code: &str) -> Result<Handshake, ProviderError>;
}

pub type IdentityProviderDyn = Arc<dyn IdentityProvider>;
