// SPDX-License-Identifier: MIT
// Copyright 2026 The pe-yoga Authors

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile, credentials and subscription sub-document)
//! - Email index (one document per address, enforces uniqueness)
//!
//! An in-memory backend with the same semantics is used for offline mode and tests.

use crate::db::collections;
use crate::error::AppError;
use crate::models::User;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Document stored at `user_emails/{email}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailIndex {
    user_id: String,
}

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
}

#[derive(Default)]
struct MemoryStore {
    users: DashMap<String, User>,
    emails: DashMap<String, String>,
    #[cfg(test)]
    fail_user_writes: std::sync::atomic::AtomicBool,
}

/// Document database handle, created once at startup and shared via `AppState`.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
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

        Ok(Self {
            backend: Backend::Firestore(client),
        })
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

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory database (offline mode and tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.users.get(user_id).map(|u| u.clone())),
        }
    }

    /// Find a user by (normalized) email address.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let index: Option<EmailIndex> = client
                    .fluent()
                    .select()
                    .by_id_in(collections::USER_EMAILS)
                    .obj()
                    .one(email)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;

                match index {
                    Some(index) => self.get_user(&index.user_id).await,
                    None => Ok(None),
                }
            }
            Backend::Memory(store) => {
                let user_id = store.emails.get(email).map(|id| id.clone());
                match user_id {
                    Some(id) => self.get_user(&id).await,
                    None => Ok(None),
                }
            }
        }
    }

    /// Find the user owning a Stripe customer ID.
    pub async fn find_user_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, AppError> {
        self.find_user_by_field("subscription.stripeCustomerId", customer_id, |u| {
            u.subscription.stripe_customer_id.as_deref() == Some(customer_id)
        })
        .await
    }

    /// Find the user with an outstanding reset token (matched by hash).
    pub async fn find_user_by_reset_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, AppError> {
        self.find_user_by_field("resetTokenHash", token_hash, |u| {
            u.reset_token_hash.as_deref() == Some(token_hash)
        })
        .await
    }

    async fn find_user_by_field<F>(
        &self,
        field: &'static str,
        value: &str,
        matches: F,
    ) -> Result<Option<User>, AppError>
    where
        F: Fn(&User) -> bool,
    {
        match &self.backend {
            Backend::Firestore(client) => {
                let value = value.to_string();
                let users: Vec<User> = client
                    .fluent()
                    .select()
                    .from(collections::USERS)
                    .filter(move |q| q.for_all([q.field(field).eq(value.clone())]))
                    .limit(1)
                    .obj()
                    .query()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok(users.into_iter().next())
            }
            Backend::Memory(store) => Ok(store
                .users
                .iter()
                .find(|entry| matches(entry.value()))
                .map(|entry| entry.value().clone())),
        }
    }

    /// Insert a new user, reserving their email address.
    ///
    /// Returns `AppError::EmailInUse` if the address is already registered.
    /// If the user document cannot be written the reservation is released.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        self.reserve_email(&user.email, &user.id).await?;

        if let Err(e) = self.update_user(user).await {
            tracing::warn!(error = %e, user_id = %user.id, "User write failed, releasing email");
            if let Err(release_err) = self.release_email(&user.email).await {
                tracing::error!(
                    error = %release_err,
                    user_id = %user.id,
                    "Failed to release email reservation"
                );
            }
            return Err(e);
        }

        Ok(())
    }

    async fn reserve_email(&self, email: &str, user_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let index = EmailIndex {
                    user_id: user_id.to_string(),
                };

                // Insert fails if the document exists, so the index doubles as a unique constraint
                let inserted: Result<EmailIndex, _> = client
                    .fluent()
                    .insert()
                    .into(collections::USER_EMAILS)
                    .document_id(email)
                    .object(&index)
                    .execute()
                    .await;

                match inserted {
                    Ok(_) => Ok(()),
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                        Err(AppError::EmailInUse)
                    }
                    Err(e) => Err(AppError::Database(e.to_string())),
                }
            }
            Backend::Memory(store) => match store.emails.entry(email.to_string()) {
                Entry::Occupied(_) => Err(AppError::EmailInUse),
                Entry::Vacant(slot) => {
                    slot.insert(user_id.to_string());
                    Ok(())
                }
            },
        }
    }

    async fn release_email(&self, email: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .delete()
                .from(collections::USER_EMAILS)
                .document_id(email)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => {
                store.emails.remove(email);
                Ok(())
            }
        }
    }

    /// Replace a user document.
    ///
    /// Not transactional: concurrent writers for the same user race and the
    /// last write wins.
    pub async fn update_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: () = client
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
            Backend::Memory(store) => {
                #[cfg(test)]
                if store
                    .fail_user_writes
                    .load(std::sync::atomic::Ordering::SeqCst)
                {
                    return Err(AppError::Database("injected write failure".to_string()));
                }
                store.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }
}
