//! Storage backends for the blog server
//!
//! All persistence goes through the `Storage` trait. Anything that spans
//! more than one read runs inside a `StorageTx`, acquired at repeatable-read
//! read-write isolation; the transaction is the only concurrency-control
//! mechanism for user and post rows.

pub mod memory;
pub mod postgres;

use crate::error::StorageError;
use crate::model::{IdentityProvider, NewPost, NewUser, Post, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Storage trait for persisting users and posts
#[async_trait]
pub trait Storage: Send + Sync {
    /// Begin a transaction at repeatable-read, read-write isolation.
    ///
    /// The returned handle must be finished with `commit` or `rollback`;
    /// a dropped handle is rolled back by the backend.
    async fn begin(&self) -> Result<Box<dyn StorageTx>, StorageError>;
}

/// One open transaction
///
/// Reads observe a snapshot taken at `begin`. Writes become visible to other
/// transactions only after `commit` returns Ok.
#[async_trait]
pub trait StorageTx: Send {
    /// Look up a user by identity; soft-deleted rows are invisible
    async fn get_user_by_email_and_provider(
        &mut self,
        email: &str,
        provider: IdentityProvider,
    ) -> Result<Option<User>, StorageError>;

    /// Look up a user by primary key; soft-deleted rows are invisible
    async fn get_user_by_id(&mut self, id: i64) -> Result<Option<User>, StorageError>;

    /// Insert a user row; fails with UniqueViolation if the
    /// (email, identity_provider) pair is already committed
    async fn create_user(&mut self, user: NewUser, now: DateTime<Utc>)
    -> Result<User, StorageError>;

    /// Look up a post by primary key; soft-deleted rows are invisible
    async fn get_post(&mut self, id: i64) -> Result<Option<Post>, StorageError>;

    /// List posts newest-first. `before_id` of 0 starts from the newest row;
    /// otherwise only rows with a smaller id are returned.
    async fn list_posts(&mut self, before_id: i64, limit: i64)
    -> Result<Vec<Post>, StorageError>;

    /// Insert a post row
    async fn create_post(&mut self, post: NewPost, now: DateTime<Utc>)
    -> Result<Post, StorageError>;

    /// Soft-delete a post by stamping deleted_at
    async fn soft_delete_post(&mut self, id: i64, now: DateTime<Utc>)
    -> Result<(), StorageError>;

    /// Commit the transaction, making all staged writes visible
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Roll back the transaction, discarding all staged writes
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

/// Create a storage backend from configuration
pub async fn create_storage_from_config(
    config: &crate::config::StorageConfig,
) -> crate::Result<Arc<dyn Storage>> {
    match config.driver.as_str() {
        "memory" => Ok(Arc::new(MemoryStorage::new())),
        "postgres" => Ok(Arc::new(PostgresStorage::new(&config.dsn).await?)),
        _ => Err(crate::BlogError::config(format!(
            "Unknown storage driver: {}. Supported: memory, postgres",
            config.driver
        ))),
    }
}

#[cfg(test)]
mod memory_test;
