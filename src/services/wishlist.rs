// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wishlist operations: gifts, friends and claiming.
//!
//! Every mutation is a read of the live user record followed by a full
//! overwrite. Two concurrent mutations of one user can lose an update; see
//! `test_concurrent_edits_last_writer_wins`.

use crate::db::Directory;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::{FriendSummary, Gift, Photo, User};
use crate::time_utils::now_rfc3339;
use futures_util::{stream, StreamExt};
use serde::Serialize;

const MAX_CONCURRENT_DB_OPS: usize = 8;

/// Input for a new wishlist entry.
#[derive(Debug, Clone)]
pub struct NewGift {
    pub description: String,
    pub url: Option<String>,
}

/// The signed-in user's own page.
#[derive(Debug, Serialize)]
pub struct HomeUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub google_id: String,
    pub photos: Vec<Photo>,
    pub gifts: Vec<Gift>,
    /// Friends with their records filled in
    pub friends: Vec<FriendSummary>,
}

#[derive(Clone)]
pub struct WishlistService {
    db: Directory,
}

impl WishlistService {
    pub fn new(db: Directory) -> Self {
        Self { db }
    }

    async fn load_actor(&self, actor: &AuthUser) -> Result<User, AppError> {
        self.db
            .get_user(&actor.user_id)
            .await?
            .ok_or_else(AppError::no_such_user)
    }

    /// Live record of the acting user with friends populated.
    pub async fn home(&self, actor: &AuthUser) -> Result<HomeUser, AppError> {
        let user = self.load_actor(actor).await?;

        let friends: Vec<Option<User>> = stream::iter(user.friends.clone())
            .map(|friend_id| {
                let db = self.db.clone();
                async move { db.get_user(&friend_id).await }
            })
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<User>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>, AppError>>()?;

        Ok(HomeUser {
            id: user.id,
            display_name: user.display_name,
            google_id: user.google_id,
            photos: user.photos,
            gifts: user.gifts,
            // Dangling references are skipped rather than failing the page
            friends: friends.iter().flatten().map(FriendSummary::from).collect(),
        })
    }

    /// Append a gift to the acting user's wishlist.
    pub async fn add_gift(&self, actor: &AuthUser, new_gift: NewGift) -> Result<Gift, AppError> {
        let mut user = self.load_actor(actor).await?;

        let now = now_rfc3339();
        let gift = Gift::new(new_gift.description, new_gift.url, &now);
        user.gifts.push(gift.clone());
        user.updated_at = now;

        self.db.save_user(&user).await?;

        tracing::info!(user_id = %user.id, gift_id = %gift.id, "Gift added");
        Ok(gift)
    }

    /// Add the user with provider id `google_id` to the acting user's friends.
    ///
    /// One-directional: the friend's own list is left alone.
    pub async fn add_friend(&self, actor: &AuthUser, google_id: &str) -> Result<User, AppError> {
        if actor.google_id == google_id {
            return Err(AppError::SelfFriendship);
        }

        let friend = self
            .db
            .find_by_provider_id(google_id)
            .await?
            .ok_or_else(AppError::no_such_friend)?;

        let mut user = self.load_actor(actor).await?;

        // A stale credential can still carry an id that now matches the target.
        if friend.id == user.id {
            return Err(AppError::SelfFriendship);
        }

        if user.has_friend(&friend.id) {
            tracing::debug!(user_id = %user.id, friend_id = %friend.id, "Already friends");
            return Ok(friend);
        }

        user.friends.push(friend.id.clone());
        user.updated_at = now_rfc3339();
        self.db.save_user(&user).await?;

        tracing::info!(user_id = %user.id, friend_id = %friend.id, "Friend added");
        Ok(friend)
    }

    /// Look up a user's page by provider id.
    pub async fn friend_page(&self, google_id: &str) -> Result<User, AppError> {
        self.db
            .find_by_provider_id(google_id)
            .await?
            .ok_or_else(AppError::no_such_user)
    }

    /// Mark a friend's gift as claimed by the acting user.
    ///
    /// Returns the friend's updated record.
    pub async fn complete_gift(
        &self,
        actor: &AuthUser,
        friend_id: &str,
        gift_id: &str,
    ) -> Result<User, AppError> {
        if friend_id == actor.user_id {
            return Err(AppError::Forbidden(
                "You cannot claim your own gift".to_string(),
            ));
        }

        let user = self.load_actor(actor).await?;
        if !user.has_friend(friend_id) {
            return Err(AppError::Forbidden(
                "You can only claim gifts of your friends".to_string(),
            ));
        }

        let mut friend = self
            .db
            .get_user(friend_id)
            .await?
            .ok_or_else(AppError::no_such_friend)?;

        let now = now_rfc3339();
        let gift = friend.gift_mut(gift_id).ok_or_else(AppError::no_such_gift)?;

        if gift.completed {
            return Err(AppError::Conflict("Gift already completed".to_string()));
        }

        gift.completed = true;
        gift.completed_by = Some(user.id.clone());
        gift.completed_date = Some(now.clone());
        friend.updated_at = now;

        self.db.save_user(&friend).await?;

        tracing::info!(
            user_id = %user.id,
            friend_id = %friend.id,
            gift_id,
            "Gift completed"
        );
        Ok(friend)
    }
}
