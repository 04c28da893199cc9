// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, friends and embedded gifts)
//! - Provider identities (unique index from Google id to local id)

use crate::db::{collections, InsertOutcome};
use crate::error::AppError;
use crate::models::User;
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

/// Index document, keyed by the URL-encoded provider id.
///
/// Created with a create-only insert, so at most one user can ever be bound
/// to a provider identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIdentity {
    pub user_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by local id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user through the provider identity index.
    pub async fn find_by_provider_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let identity: Option<ProviderIdentity> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::PROVIDER_IDENTITIES)
            .obj()
            .one(&identity_doc_id(google_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match identity {
            Some(identity) => self.get_user(&identity.user_id).await,
            None => Ok(None),
        }
    }

    /// Insert a brand new user and claim its provider identity.
    ///
    /// The user document goes in first under its fresh id; the identity claim
    /// decides the winner. A loser removes its orphaned user document.
    pub async fn insert_user(&self, user: &User) -> Result<InsertOutcome, AppError> {
        let _: User = self
            .client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let identity = ProviderIdentity {
            user_id: user.id.clone(),
        };

        let claim: Result<ProviderIdentity, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::PROVIDER_IDENTITIES)
            .document_id(identity_doc_id(&user.google_id))
            .object(&identity)
            .execute()
            .await;

        match claim {
            Ok(_) => Ok(InsertOutcome::Created),
            Err(FirestoreError::DataConflictError(_)) => {
                tracing::info!(
                    google_id = %user.google_id,
                    user_id = %user.id,
                    "Provider identity already claimed, dropping duplicate user"
                );
                self.delete_user_doc(&user.id).await?;
                Ok(InsertOutcome::AlreadyExists)
            }
            Err(e) => {
                if let Err(cleanup) = self.delete_user_doc(&user.id).await {
                    tracing::error!(error = %cleanup, user_id = %user.id, "Failed to remove orphaned user");
                }
                Err(AppError::Database(e.to_string()))
            }
        }
    }

    /// Overwrite a user document.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_user_doc(&self, user_id: &str) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

/// Provider ids become document ids; keep them free of path separators.
fn identity_doc_id(google_id: &str) -> String {
    urlencoding::encode(google_id).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_doc_id_escapes_separators() {
        assert_eq!(identity_doc_id("1092837465"), "1092837465");
        assert_eq!(identity_doc_id("a/b"), "a%2Fb");
    }
}
