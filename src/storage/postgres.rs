//! PostgreSQL storage backend
//!
//! Production implementation of the Storage trait over a sqlx connection
//! pool. Transactions are opened at repeatable-read isolation; sqlx rolls
//! back any transaction handle that is dropped without an explicit commit.

use super::{Storage, StorageTx};
use crate::error::StorageError;
use crate::model::{IdentityProvider, NewPost, NewUser, Post, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

const USER_COLUMNS: &str =
    "id, identity_provider, email, username, avatar_url, about_me, created_at, updated_at, deleted_at";

const POST_COLUMNS: &str =
    "id, user_id, title, body, likes, views, created_at, updated_at, deleted_at";

/// PostgreSQL storage implementation
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new PostgreSQL storage from a connection string
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StorageError::Connection(format!("connecting to PostgreSQL: {e}")))?;

        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .map_err(|e| StorageError::Database(format!("running migrations: {e}")))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn begin(&self) -> Result<Box<dyn StorageTx>, StorageError> {
        let mut tx = self.pool.begin().await?;
        // must be the first statement in the transaction
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

struct PostgresTx {
    tx: Transaction<'static, Postgres>,
}

fn parse_user(row: &PgRow) -> Result<User, StorageError> {
    Ok(User {
        id: row.try_get("id")?,
        identity_provider: IdentityProvider::from_str_lossy(
            &row.try_get::<String, _>("identity_provider")?,
        ),
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        avatar_url: row.try_get("avatar_url")?,
        about_me: row.try_get("about_me")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn parse_post(row: &PgRow) -> Result<Post, StorageError> {
    Ok(Post {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        likes: row.try_get("likes")?,
        views: row.try_get("views")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

#[async_trait]
impl StorageTx for PostgresTx {
    async fn get_user_by_email_and_provider(
        &mut self,
        email: &str,
        provider: IdentityProvider,
    ) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE email = $1 AND identity_provider = $2 AND deleted_at IS NULL"
        ))
        .bind(email)
        .bind(provider.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(parse_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_id(&mut self, id: i64) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(parse_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_user(
        &mut self,
        user: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, StorageError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (identity_provider, email, username, avatar_url, about_me, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.identity_provider.as_str())
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.avatar_url)
        .bind(&user.about_me)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        parse_user(&row)
    }

    async fn get_post(&mut self, id: i64) -> Result<Option<Post>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(Some(parse_post(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_posts(
        &mut self,
        before_id: i64,
        limit: i64,
    ) -> Result<Vec<Post>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS} FROM posts
             WHERE deleted_at IS NULL AND ($1 = 0 OR id < $1)
             ORDER BY id DESC
             LIMIT $2"
        ))
        .bind(before_id)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in &rows {
            posts.push(parse_post(row)?);
        }
        Ok(posts)
    }

    async fn create_post(
        &mut self,
        post: NewPost,
        now: DateTime<Utc>,
    ) -> Result<Post, StorageError> {
        let row = sqlx::query(&format!(
            "INSERT INTO posts (user_id, title, body, likes, views, created_at, updated_at)
             VALUES ($1, $2, $3, 0, 0, $4, $4)
             RETURNING {POST_COLUMNS}"
        ))
        .bind(post.user_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        parse_post(&row)
    }

    async fn soft_delete_post(
        &mut self,
        id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query("UPDATE posts SET deleted_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(StorageError::from)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.rollback().await.map_err(StorageError::from)
    }
}
