//! Core data models for the blog server
//!
//! Users, posts, identity profiles, and the request principal. These types
//! are shared by the auth core, the storage layer, and the HTTP handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Third-party identity provider that authenticated the end user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    #[default]
    Unspecified,
    Github,
}

impl IdentityProvider {
    /// Stable string form, used as the database column value
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::Unspecified => "unspecified",
            IdentityProvider::Github => "github",
        }
    }

    /// Parse the database column value back; unknown values map to Unspecified
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "github" => IdentityProvider::Github,
            _ => IdentityProvider::Unspecified,
        }
    }
}

impl std::fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile returned by an identity provider after code exchange
///
/// Transient: exists only for the duration of one login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
}

impl IdentityProfile {
    /// Provisional username for a first login: the email local part.
    ///
    /// A placeholder policy, not an invariant; users rename themselves later.
    pub fn temp_username(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}

/// Authenticated identity attached to a request after token validation
///
/// Created per inbound request by the authentication interceptor; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
}

/// Persisted user record
///
/// At most one row exists per (email, identity_provider) pair; the storage
/// layer enforces this with a unique constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub identity_provider: IdentityProvider,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub about_me: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a user row; the id and timestamps are assigned by
/// the storage layer
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identity_provider: IdentityProvider,
    pub email: String,
    pub username: String,
    pub avatar_url: String,
    pub about_me: String,
}

/// Persisted blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub likes: i64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Fields for inserting a post row
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod model_test {
    include!("model_test.rs");
}
