// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: the only persistent state of the application.
//!
//! [`Directory`] fronts one backend (Firestore, in-memory, or offline) and
//! bounds every call with [`DIRECTORY_TIMEOUT`].

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::User;
use crate::services::ProviderProfile;
use crate::time_utils::now_rfc3339;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Unique index from provider id to local user id
    pub const PROVIDER_IDENTITIES: &str = "provider_identities";
}

/// Upper bound on a single directory call.
pub const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a create-only user insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// Another user already holds this provider identity.
    AlreadyExists,
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreDb),
    Memory(Arc<MemoryDb>),
    Offline,
}

/// Handle to the user directory. Cheap to clone.
#[derive(Clone)]
pub struct Directory {
    backend: Backend,
}

impl Directory {
    pub fn firestore(db: FirestoreDb) -> Self {
        Self {
            backend: Backend::Firestore(db),
        }
    }

    pub fn memory(store: Arc<MemoryDb>) -> Self {
        Self {
            backend: Backend::Memory(store),
        }
    }

    /// Create an offline directory for testing.
    ///
    /// All operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    /// Get a user by local id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => bounded(db.get_user(user_id)).await,
            Backend::Memory(db) => Ok(db.get_user(user_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Get a user by provider identity.
    pub async fn find_by_provider_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(db) => bounded(db.find_by_provider_id(google_id)).await,
            Backend::Memory(db) => Ok(db.find_by_provider_id(google_id)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create-only insert, refused when the provider identity is taken.
    pub async fn insert_user(&self, user: &User) -> Result<InsertOutcome, AppError> {
        match &self.backend {
            Backend::Firestore(db) => bounded(db.insert_user(user)).await,
            Backend::Memory(db) => Ok(db.insert_user(user)),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Overwrite the stored user document.
    ///
    /// There is no version check: concurrent read-modify-write cycles on the
    /// same user are last-writer-wins.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(db) => bounded(db.save_user(user)).await,
            Backend::Memory(db) => {
                db.save_user(user);
                Ok(())
            }
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Resolve a confirmed provider profile to a local user, creating it on
    /// first sight.
    ///
    /// An existing record is returned unchanged; the profile's name and photos
    /// are only used when creating.
    pub async fn lookup_or_create(&self, profile: &ProviderProfile) -> Result<User, AppError> {
        if let Some(user) = self.find_by_provider_id(&profile.id).await? {
            tracing::debug!(google_id = %profile.id, user_id = %user.id, "Known user");
            return Ok(user);
        }

        let candidate = User::from_profile(profile, &now_rfc3339());

        match self.insert_user(&candidate).await? {
            InsertOutcome::Created => {
                tracing::info!(
                    google_id = %candidate.google_id,
                    user_id = %candidate.id,
                    "Created user on first login"
                );
                Ok(candidate)
            }
            InsertOutcome::AlreadyExists => {
                tracing::info!(google_id = %profile.id, "Lost first-login race, re-fetching");
                self.find_by_provider_id(&profile.id).await?.ok_or_else(|| {
                    AppError::Database(format!(
                        "Provider identity {} claimed but user missing",
                        profile.id
                    ))
                })
            }
        }
    }
}

async fn bounded<T>(
    fut: impl Future<Output = Result<T, AppError>>,
) -> Result<T, AppError> {
    tokio::time::timeout(DIRECTORY_TIMEOUT, fut)
        .await
        .map_err(|_| AppError::Database("Directory call timed out".to_string()))?
}
