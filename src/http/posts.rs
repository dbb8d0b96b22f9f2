//! Blog-post endpoints
//!
//! Create and delete require an authenticated principal; reads are open.

use super::{AppError, AppState};
use crate::constants;
use crate::model::{IdentityProvider, Post, Principal, User};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub about_me: String,
    pub identity_provider: IdentityProvider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_url,
            about_me: user.about_me,
            identity_provider: user.identity_provider,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub likes: i64,
    pub views: i64,
    pub author: UserDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostDto {
    fn new(post: Post, author: User) -> Self {
        Self {
            id: post.id,
            title: post.title,
            body: post.body,
            likes: post.likes,
            views: post.views,
            author: author.into(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostSummaryDto {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub likes: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostSummaryDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            likes: post.likes,
            views: post.views,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostDto,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    #[serde(default)]
    pub cursor: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListPostsResponse {
    pub posts: Vec<PostSummaryDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let (post, author) = state.posts.create(principal, req.title, req.body).await?;
    Ok(Json(PostResponse {
        post: PostDto::new(post, author),
    }))
}

/// GET /api/v1/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    let (post, author) = state.posts.get(id).await?;
    Ok(Json(PostResponse {
        post: PostDto::new(post, author),
    }))
}

/// GET /api/v1/posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListPostsParams>,
) -> Result<Json<ListPostsResponse>, AppError> {
    let limit = params.limit.unwrap_or(constants::DEFAULT_PAGE_SIZE);
    let (posts, next_cursor) = state.posts.list(&params.cursor, limit).await?;
    Ok(Json(ListPostsResponse {
        posts: posts.into_iter().map(PostSummaryDto::from).collect(),
        next_cursor,
    }))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.posts.delete(principal, id).await?;
    Ok(Json(serde_json::json!({})))
}
