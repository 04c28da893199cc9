// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session store.
//!
//! Sessions hold a full copy of the user record taken at login
//! (denormalized session state). Requests get that copy back without a
//! directory read, so it goes stale as the stored user changes; handlers
//! that mutate state always re-fetch by id.
//!
//! Clients only ever see a reference `<handle>.<hmac>`; the handle is 32
//! random bytes, the HMAC binds it to the session secret.
//!
//! Sessions expire [`SESSION_TTL`] after login whether or not the browser
//! logs out. Expired entries are dropped when looked up and swept on every
//! new login.

use crate::middleware::auth::CredentialError;
use crate::models::User;
use anyhow::anyhow;
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::time::{Duration, Instant};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const HANDLE_BYTES: usize = 32;

/// Absolute session lifetime, same as a token's.
pub const SESSION_TTL: Duration =
    Duration::from_secs(crate::middleware::auth::TOKEN_TTL_SECS as u64);

struct Session {
    user: User,
    expires_at: Instant,
}

/// In-process session store, alive for the process lifetime.
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    key: [u8; 32],
    ttl: Duration,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(key: [u8; 32]) -> Self {
        Self::with_ttl(key, SESSION_TTL)
    }

    pub fn with_ttl(key: [u8; 32], ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            key,
            ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Store `user` under a fresh handle and return the signed reference.
    pub fn create(&self, user: &User) -> anyhow::Result<String> {
        let mut raw = [0u8; HANDLE_BYTES];
        self.rng
            .fill(&mut raw)
            .map_err(|_| anyhow!("system RNG failure"))?;
        let handle = hex::encode(raw);

        let signature = self
            .sign(&handle)
            .ok_or_else(|| anyhow!("HMAC init failed"))?;
        self.purge_expired();
        self.sessions.insert(
            handle.clone(),
            Session {
                user: user.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        tracing::debug!(user_id = %user.id, "Session created");

        Ok(format!("{}.{}", handle, signature))
    }

    /// Look up the user behind a signed reference.
    pub fn resolve(&self, reference: &str) -> Result<User, CredentialError> {
        let handle = self.verified_handle(reference)?;
        let now = Instant::now();

        if let Some(entry) = self.sessions.get(handle) {
            if entry.expires_at > now {
                return Ok(entry.user.clone());
            }
        }

        // Expired or unknown
        if self
            .sessions
            .remove_if(handle, |_, session| session.expires_at <= now)
            .is_some()
        {
            tracing::debug!("Session expired");
        }
        Err(CredentialError::InvalidCredential)
    }

    /// Drop every expired session.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            tracing::debug!(purged, "Expired sessions removed");
        }
    }

    /// Drop the session behind a reference. Unknown or forged references are ignored.
    pub fn destroy(&self, reference: &str) {
        if let Ok(handle) = self.verified_handle(reference) {
            self.sessions.remove(handle);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn verified_handle<'a>(&self, reference: &'a str) -> Result<&'a str, CredentialError> {
        let (handle, signature) = reference
            .split_once('.')
            .ok_or(CredentialError::InvalidCredential)?;

        let expected = self
            .sign(handle)
            .ok_or(CredentialError::InvalidCredential)?;
        if expected.as_bytes().ct_eq(signature.as_bytes()).into() {
            Ok(handle)
        } else {
            Err(CredentialError::InvalidCredential)
        }
    }

    fn sign(&self, handle: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(handle.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> User {
        User {
            id: "u-bob".to_string(),
            display_name: "Bob".to_string(),
            google_id: "g2".to_string(),
            photos: vec![],
            friends: vec![],
            gifts: vec![],
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_session_roundtrip_returns_full_user() {
        let store = SessionStore::new([7u8; 32]);
        let reference = store.create(&bob()).unwrap();

        assert_eq!(store.resolve(&reference), Ok(bob()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_forged_reference_rejected() {
        let store = SessionStore::new([7u8; 32]);
        let reference = store.create(&bob()).unwrap();
        let (handle, _) = reference.split_once('.').unwrap();

        assert_eq!(
            store.resolve(&format!("{handle}.deadbeef")),
            Err(CredentialError::InvalidCredential)
        );
        assert_eq!(
            store.resolve(handle),
            Err(CredentialError::InvalidCredential)
        );
    }

    #[test]
    fn test_reference_from_other_secret_rejected() {
        let issuer = SessionStore::new([1u8; 32]);
        let other = SessionStore::new([2u8; 32]);
        let reference = issuer.create(&bob()).unwrap();

        assert_eq!(
            other.resolve(&reference),
            Err(CredentialError::InvalidCredential)
        );
    }

    #[test]
    fn test_destroyed_session_is_invalid() {
        let store = SessionStore::new([7u8; 32]);
        let reference = store.create(&bob()).unwrap();

        store.destroy(&reference);

        assert!(store.is_empty());
        assert_eq!(
            store.resolve(&reference),
            Err(CredentialError::InvalidCredential)
        );
    }

    #[test]
    fn test_expired_session_is_invalid_and_removed() {
        let store = SessionStore::with_ttl([7u8; 32], Duration::ZERO);
        let reference = store.create(&bob()).unwrap();
        assert_eq!(store.len(), 1);

        assert_eq!(
            store.resolve(&reference),
            Err(CredentialError::InvalidCredential)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_abandoned_sessions_are_swept_on_login() {
        let store = SessionStore::with_ttl([7u8; 32], Duration::ZERO);
        for _ in 0..100 {
            store.create(&bob()).unwrap();
        }

        // Each login sweeps the ones before it
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_live_session_survives_sweep() {
        let store = SessionStore::new([7u8; 32]);
        let first = store.create(&bob()).unwrap();
        store.create(&bob()).unwrap();

        store.purge_expired();

        assert_eq!(store.len(), 2);
        assert_eq!(store.resolve(&first), Ok(bob()));
    }
}
