//! Blog-post operations
//!
//! Plain record read/write over the storage trait. Each operation runs in
//! its own transaction; an error drops the handle and the backend rolls the
//! transaction back.

use crate::error::StorageError;
use crate::model::{NewPost, Post, Principal, User};
use crate::storage::Storage;
use crate::{BlogError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Post service exposed to transport handlers
#[derive(Clone)]
pub struct PostService {
    storage: Arc<dyn Storage>,
}

impl PostService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create a post authored by the authenticated caller
    pub async fn create(
        &self,
        principal: Principal,
        title: String,
        body: String,
    ) -> Result<(Post, User)> {
        let mut tx = self.storage.begin().await?;
        let author = tx
            .get_user_by_id(principal.user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", principal.user_id)))?;
        let post = tx
            .create_post(
                NewPost {
                    user_id: author.id,
                    title,
                    body,
                },
                Utc::now(),
            )
            .await?;
        tx.commit().await?;
        Ok((post, author))
    }

    /// Fetch a post and its author
    pub async fn get(&self, id: i64) -> Result<(Post, User)> {
        let mut tx = self.storage.begin().await?;
        let post = tx
            .get_post(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("post {id}")))?;
        let author = tx
            .get_user_by_id(post.user_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("user {}", post.user_id)))?;
        tx.commit().await?;
        Ok((post, author))
    }

    /// List posts newest-first from an opaque cursor.
    ///
    /// Returns the page and, when more rows remain, the cursor for the next
    /// page.
    pub async fn list(&self, cursor: &str, limit: i64) -> Result<(Vec<Post>, Option<String>)> {
        let limit = limit.clamp(1, crate::constants::MAX_PAGE_SIZE);
        let before_id = crate::cursor::parse_i64(cursor);

        let mut tx = self.storage.begin().await?;
        // one extra row tells us whether another page exists
        let mut posts = tx.list_posts(before_id, limit + 1).await?;
        tx.commit().await?;

        let next_cursor = if posts.len() as i64 > limit {
            posts.truncate(limit as usize);
            posts.last().map(|p| crate::cursor::from_i64(p.id))
        } else {
            None
        };
        Ok((posts, next_cursor))
    }

    /// Soft-delete a post; only its author may do so
    pub async fn delete(&self, principal: Principal, id: i64) -> Result<()> {
        let mut tx = self.storage.begin().await?;
        let post = tx
            .get_post(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("post {id}")))?;
        if post.user_id != principal.user_id {
            return Err(BlogError::permission_denied(format!(
                "post {id} does not belong to the caller"
            )));
        }
        tx.soft_delete_post(id, Utc::now()).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod post_test;
