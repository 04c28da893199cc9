// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User and gift models for storage and views.

use serde::{Deserialize, Serialize};

/// A photo reference as handed back by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub value: String,
}

/// User record stored in the directory.
///
/// Field names keep the wire names of the stored documents (`_id`,
/// `displayName`, `google_id`) so existing records stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Local identifier (also used as document ID)
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Provider identity, unique across all users
    pub google_id: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    /// Local ids of users this user has added as friends
    #[serde(default)]
    pub friends: Vec<String>,
    /// Wishlist entries owned by this user, in insertion order
    #[serde(default)]
    pub gifts: Vec<Gift>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl User {
    /// Build a fresh user from a confirmed provider profile.
    pub fn from_profile(profile: &crate::services::ProviderProfile, now: &str) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            display_name: profile.display_name.clone(),
            google_id: profile.id.clone(),
            photos: profile.photos.clone(),
            friends: Vec::new(),
            gifts: Vec::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    pub fn has_friend(&self, user_id: &str) -> bool {
        self.friends.iter().any(|f| f == user_id)
    }

    pub fn gift_mut(&mut self, gift_id: &str) -> Option<&mut Gift> {
        self.gifts.iter_mut().find(|g| g.id == gift_id)
    }
}

/// A wishlist entry, embedded in its owner's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gift {
    #[serde(rename = "_id")]
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(
        rename = "completedBy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_by: Option<String>,
    #[serde(
        rename = "completedDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_date: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Gift {
    pub fn new(description: String, url: Option<String>, now: &str) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            description,
            url,
            completed: false,
            completed_by: None,
            completed_date: None,
            created_at: now.to_string(),
        }
    }
}

/// Friend entry as shown on the home view (populated reference).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub google_id: String,
    pub photos: Vec<Photo>,
}

impl From<&User> for FriendSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            display_name: user.display_name.clone(),
            google_id: user.google_id.clone(),
            photos: user.photos.clone(),
        }
    }
}
