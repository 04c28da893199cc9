// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store for local development and tests.

use crate::db::InsertOutcome;
use crate::models::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Users keyed by local id, plus the provider identity index.
#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<String, User>,
    provider_index: DashMap<String, String>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|u| u.clone())
    }

    pub fn find_by_provider_id(&self, google_id: &str) -> Option<User> {
        let user_id = self.provider_index.get(google_id)?.clone();
        self.get_user(&user_id)
    }

    /// Insert a user unless its provider identity is already taken.
    ///
    /// The index shard stays locked while the user is written, so concurrent
    /// inserts for one identity serialize here.
    pub fn insert_user(&self, user: &User) -> InsertOutcome {
        match self.provider_index.entry(user.google_id.clone()) {
            Entry::Occupied(_) => InsertOutcome::AlreadyExists,
            Entry::Vacant(slot) => {
                self.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                InsertOutcome::Created
            }
        }
    }

    pub fn save_user(&self, user: &User) {
        self.users.insert(user.id.clone(), user.clone());
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
