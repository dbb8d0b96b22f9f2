//! Identity reconciliation
//!
//! Links an external identity to a local user row with a get-or-create
//! inside one repeatable-read transaction. That transaction is the entire
//! race-prevention mechanism: when concurrent first logins for the same
//! (email, provider) pair collide, exactly one insert commits; every other
//! caller lands on the committed row via a re-lookup.

use crate::error::StorageError;
use crate::model::{IdentityProfile, IdentityProvider, NewUser, User};
use crate::storage::{Storage, StorageTx};
use crate::{BlogError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Runs the get-or-create-user operation for the login flow
#[derive(Clone)]
pub struct UserReconciler {
    storage: Arc<dyn Storage>,
}

impl UserReconciler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Get or create the user for an identity.
    ///
    /// Returns the user row and whether it was created by this call. Only a
    /// lookup miss leads to an insert; any other lookup failure aborts. A
    /// unique-constraint violation on the insert or commit means another
    /// login won the race, and resolves to a re-lookup of the winner's row.
    pub async fn reconcile(
        &self,
        profile: &IdentityProfile,
        provider: IdentityProvider,
    ) -> Result<(User, bool)> {
        let mut tx = self.storage.begin().await?;

        match tx
            .get_user_by_email_and_provider(&profile.email, provider)
            .await
        {
            Ok(Some(user)) => {
                tx.commit().await?;
                return Ok((user, false));
            }
            Ok(None) => {}
            Err(err) => return Err(abort(tx, err).await),
        }

        let new_user = NewUser {
            identity_provider: provider,
            email: profile.email.clone(),
            username: profile.temp_username().to_string(),
            avatar_url: profile.avatar_url.clone(),
            about_me: String::new(),
        };

        let user = match tx.create_user(new_user, Utc::now()).await {
            Ok(user) => user,
            Err(err) if err.is_unique_violation() => {
                if let Err(rollback) = tx.rollback().await {
                    return Err(compose_rollback(err, rollback));
                }
                return self.lookup_winner(profile, provider).await;
            }
            Err(err) => return Err(abort(tx, err).await),
        };

        match tx.commit().await {
            Ok(()) => {
                tracing::info!(user_id = user.id, provider = %provider, "created user on first login");
                Ok((user, true))
            }
            Err(err) if err.is_unique_violation() => self.lookup_winner(profile, provider).await,
            Err(err) => Err(err.into()),
        }
    }

    /// After losing a first-login race, read the row the winner committed.
    async fn lookup_winner(
        &self,
        profile: &IdentityProfile,
        provider: IdentityProvider,
    ) -> Result<(User, bool)> {
        let mut tx = self.storage.begin().await?;
        match tx
            .get_user_by_email_and_provider(&profile.email, provider)
            .await
        {
            Ok(Some(user)) => {
                tx.commit().await?;
                Ok((user, false))
            }
            Ok(None) => {
                let err = StorageError::Database(format!(
                    "user for provider {provider} missing after unique violation"
                ));
                Err(abort(tx, err).await)
            }
            Err(err) => Err(abort(tx, err).await),
        }
    }
}

/// Roll back and surface the original cause; a rollback failure is composed
/// into the returned error instead of being swallowed.
async fn abort(tx: Box<dyn StorageTx>, cause: StorageError) -> BlogError {
    match tx.rollback().await {
        Ok(()) => cause.into(),
        Err(rollback) => compose_rollback(cause, rollback),
    }
}

fn compose_rollback(cause: StorageError, rollback: StorageError) -> BlogError {
    StorageError::RollbackFailed {
        cause: Box::new(cause),
        rollback: Box::new(rollback),
    }
    .into()
}
