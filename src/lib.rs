// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Gift wishlist: friends, wishlists and gift claiming behind Google login.
//!
//! This crate provides the HTTP backend: the OAuth login flow, credential
//! issuing and checking, and the user directory.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Directory;
use services::{Credentials, IdentityProviderDyn, WishlistService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Directory,
    pub provider: IdentityProviderDyn,
    pub credentials: Credentials,
    pub wishlist: WishlistService,
}

impl AppState {
    pub fn new(
        config: Config,
        db: Directory,
        provider: IdentityProviderDyn,
    ) -> Result<Self, config::ConfigError> {
        let credentials = Credentials::new(&config)?;
        let wishlist = WishlistService::new(db.clone());
        Ok(Self {
            config,
            db,
            provider,
            credentials,
            wishlist,
        })
    }
}
