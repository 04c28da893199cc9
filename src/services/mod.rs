// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod credentials;
pub mod google;
pub mod provider;
pub mod session;
pub mod wishlist;

pub use credentials::{Credentials, SESSION_COOKIE, TOKEN_COOKIE};
pub use google::GoogleProvider;
pub use provider::{
    Handshake, IdentityProvider, IdentityProviderDyn, ProviderError, ProviderProfile,
};
pub use session::SessionStore;
pub use wishlist::{NewGift, WishlistService};
