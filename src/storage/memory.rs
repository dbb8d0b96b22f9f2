//! In-memory storage implementation
//!
//! Fast, non-persistent storage for development and testing. It reproduces
//! the transactional semantics the reconciler depends on: reads come from a
//! snapshot taken at begin, writes stay staged until commit, and commit
//! enforces the (email, identity_provider) unique constraint against the
//! committed state. Concurrent first-login races therefore behave like they
//! do on PostgreSQL.
//!
//! **WARNING:** not for production use; data is lost on process restart.

use super::{Storage, StorageTx};
use crate::error::StorageError;
use crate::model::{IdentityProvider, NewPost, NewUser, Post, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Debug, Clone, Default)]
struct Committed {
    users: Vec<User>,
    posts: Vec<Post>,
}

/// In-memory storage implementation
#[derive(Clone, Default)]
pub struct MemoryStorage {
    committed: Arc<Mutex<Committed>>,
    // ids come from process-wide counters, like database sequences they are
    // not rolled back with the transaction
    next_user_id: Arc<AtomicI64>,
    next_post_id: Arc<AtomicI64>,
}

impl MemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed user rows (test helper)
    pub fn user_count(&self) -> usize {
        self.committed.lock().users.len()
    }
}

enum StagedWrite {
    InsertUser(User),
    InsertPost(Post),
    SoftDeletePost { id: i64, at: DateTime<Utc> },
}

struct MemoryTx {
    committed: Arc<Mutex<Committed>>,
    snapshot: Committed,
    staged: Vec<StagedWrite>,
    next_user_id: Arc<AtomicI64>,
    next_post_id: Arc<AtomicI64>,
}

impl MemoryTx {
    fn staged_users(&self) -> impl Iterator<Item = &User> {
        self.staged.iter().filter_map(|w| match w {
            StagedWrite::InsertUser(u) => Some(u),
            _ => None,
        })
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, StorageError> {
        Ok(Box::new(MemoryTx {
            committed: self.committed.clone(),
            snapshot: self.committed.lock().clone(),
            staged: Vec::new(),
            next_user_id: self.next_user_id.clone(),
            next_post_id: self.next_post_id.clone(),
        }))
    }
}

#[async_trait]
impl StorageTx for MemoryTx {
    async fn get_user_by_email_and_provider(
        &mut self,
        email: &str,
        provider: IdentityProvider,
    ) -> Result<Option<User>, StorageError> {
        let visible = |u: &&User| {
            u.email == email && u.identity_provider == provider && u.deleted_at.is_none()
        };
        Ok(self
            .snapshot
            .users
            .iter()
            .find(visible)
            .or_else(|| self.staged_users().find(visible))
            .cloned())
    }

    async fn get_user_by_id(&mut self, id: i64) -> Result<Option<User>, StorageError> {
        let visible = |u: &&User| u.id == id && u.deleted_at.is_none();
        Ok(self
            .snapshot
            .users
            .iter()
            .find(visible)
            .or_else(|| self.staged_users().find(visible))
            .cloned())
    }

    async fn create_user(
        &mut self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        // id is assigned immediately; uniqueness is checked at commit, which
        // is where a racing transaction can fail
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = User {
            id,
            identity_provider: user.identity_provider,
            email: user.email,
            username: user.username,
            avatar_url: user.avatar_url,
            about_me: user.about_me,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.staged.push(StagedWrite::InsertUser(user.clone()));
        Ok(user)
    }

    async fn get_post(&mut self, id: i64) -> Result<Option<Post>, StorageError> {
        Ok(self
            .snapshot
            .posts
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned())
    }

    async fn list_posts(
        &mut self,
        before_id: i64,
        limit: i64,
    ) -> Result<Vec<Post>, StorageError> {
        let mut posts: Vec<Post> = self
            .snapshot
            .posts
            .iter()
            .filter(|p| p.deleted_at.is_none() && (before_id == 0 || p.id < before_id))
            .cloned()
            .collect();
        posts.sort_unstable_by(|a, b| b.id.cmp(&a.id));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn create_post(
        &mut self,
        post: NewPost,
        now: DateTime<Utc>,
    ) -> Result<Post, StorageError> {
        let id = self.next_post_id.fetch_add(1, Ordering::SeqCst) + 1;
        let post = Post {
            id,
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            likes: 0,
            views: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.staged.push(StagedWrite::InsertPost(post.clone()));
        Ok(post)
    }

    async fn soft_delete_post(
        &mut self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.staged.push(StagedWrite::SoftDeletePost { id, at: now });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryTx {
            committed, staged, ..
        } = *self;
        let mut committed = committed.lock();

        // validate the unique constraint before applying anything, so a
        // failed commit leaves the committed state untouched
        for write in &staged {
            if let StagedWrite::InsertUser(user) = write
                && committed
                    .users
                    .iter()
                    .any(|u| u.email == user.email && u.identity_provider == user.identity_provider)
            {
                return Err(StorageError::UniqueViolation(format!(
                    "users_email_identity_provider_key: ({}, {})",
                    user.email, user.identity_provider
                )));
            }
        }

        for write in staged {
            match write {
                StagedWrite::InsertUser(user) => committed.users.push(user),
                StagedWrite::InsertPost(post) => committed.posts.push(post),
                StagedWrite::SoftDeletePost { id, at } => {
                    if let Some(post) = committed.posts.iter_mut().find(|p| p.id == id) {
                        post.deleted_at = Some(at);
                        post.updated_at = at;
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}
