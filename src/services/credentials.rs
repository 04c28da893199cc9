// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential issuing and verification.
//!
//! One scheme is active per process, chosen by `CREDENTIAL_MODE`:
//! - token: signed JWT in the `jwt` cookie, valid for 7 days
//! - session: signed reference in the `sid` cookie, lives as long as the
//!   browser session

use crate::config::{Config, ConfigError, CredentialMode};
use crate::error::AppError;
use crate::middleware::auth::{
    create_jwt, verify_jwt, AuthUser, CredentialError, TOKEN_TTL_SECS,
};
use crate::models::User;
use crate::services::session::SessionStore;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Cookie carrying the signed token.
pub const TOKEN_COOKIE: &str = "jwt";
/// Cookie carrying the session reference.
pub const SESSION_COOKIE: &str = "sid";

enum Scheme {
    Token { signing_key: Vec<u8> },
    Session { store: SessionStore },
}

/// Issues credentials after login and verifies them on later requests.
pub struct Credentials {
    scheme: Scheme,
    secure_cookies: bool,
}

impl Credentials {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let scheme = match config.credential_mode {
            CredentialMode::Token => Scheme::Token {
                signing_key: config.jwt_secret.clone(),
            },
            CredentialMode::Session => Scheme::Session {
                store: SessionStore::new(
                    config
                        .session_cookie_key()
                        .ok_or(ConfigError::Missing("SESSION_SECRET"))?,
                ),
            },
        };

        Ok(Self {
            scheme,
            secure_cookies: config.secure_cookies(),
        })
    }

    pub fn mode(&self) -> CredentialMode {
        match self.scheme {
            Scheme::Token { .. } => CredentialMode::Token,
            Scheme::Session { .. } => CredentialMode::Session,
        }
    }

    /// Materialize a credential for `user` and attach it to the response jar.
    ///
    /// Does not touch the directory.
    pub fn issue(&self, jar: CookieJar, user: &User) -> Result<CookieJar, AppError> {
        let cookie = match &self.scheme {
            Scheme::Token { signing_key } => {
                let jwt = create_jwt(user, signing_key)
                    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
                self.cookie(
                    TOKEN_COOKIE,
                    jwt,
                    Some(time::Duration::seconds(TOKEN_TTL_SECS as i64)),
                )
            }
            Scheme::Session { store } => {
                let reference = store.create(user)?;
                self.cookie(SESSION_COOKIE, reference, None)
            }
        };

        tracing::info!(user_id = %user.id, mode = ?self.mode(), "Credential issued");
        Ok(jar.add(cookie))
    }

    /// Resolve the credential presented in `jar` to an acting identity.
    pub fn verify(&self, jar: &CookieJar) -> Result<AuthUser, CredentialError> {
        match &self.scheme {
            Scheme::Token { signing_key } => {
                let token = jar
                    .get(TOKEN_COOKIE)
                    .ok_or(CredentialError::NoCredential)?;
                verify_jwt(token.value(), signing_key).map(AuthUser::from)
            }
            Scheme::Session { store } => {
                let reference = jar
                    .get(SESSION_COOKIE)
                    .ok_or(CredentialError::NoCredential)?;
                store
                    .resolve(reference.value())
                    .map(|user| AuthUser::from(&user))
            }
        }
    }

    /// Forget the presented credential and expire its cookie.
    pub fn revoke(&self, jar: CookieJar) -> CookieJar {
        let name = match &self.scheme {
            Scheme::Token { .. } => TOKEN_COOKIE,
            Scheme::Session { store } => {
                if let Some(reference) = jar.get(SESSION_COOKIE) {
                    store.destroy(reference.value());
                }
                SESSION_COOKIE
            }
        };

        jar.remove(self.cookie(name, String::new(), None))
    }

    fn cookie(
        &self,
        name: &'static str,
        value: String,
        max_age: Option<time::Duration>,
    ) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build();
        if let Some(max_age) = max_age {
            cookie.set_max_age(max_age);
        }
        cookie
    }
}
