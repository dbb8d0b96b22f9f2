//! Error types for the blog server
//!
//! This module provides the error hierarchy using thiserror. All errors can
//! be converted to BlogError for unified handling; the HTTP layer maps the
//! taxonomy onto status codes in one place.

use thiserror::Error;

/// Main error type for blog server operations
#[derive(Error, Debug)]
pub enum BlogError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid redirect url: {0}")]
    InvalidRedirect(String),

    #[error("exchanging code: {0}")]
    Exchange(String),

    #[error("fetching user profile: {0}")]
    ProfileFetch(String),

    #[error("identity provider unspecified")]
    UnspecifiedProvider,

    #[error("unsupported identity provider: {0}")]
    UnsupportedProvider(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session-token specific errors
///
/// Malformed is deliberately separate from the other validation failures:
/// the interceptor classifies it as an internal error (corrupted or
/// incompatible token), while the rest are plain unauthenticated rejections.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("signing token: {0}")]
    Signing(String),

    #[error("token malformed: {0}")]
    Malformed(String),

    #[error("invalid signature")]
    SignatureInvalid,

    #[error("token not yet active")]
    NotYetValid,

    #[error("token expired")]
    Expired,

    #[error("token claims rejected: {0}")]
    ClaimsRejected(String),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A statement failed and the subsequent rollback failed too. Both causes
    /// are preserved so the caller observes the original failure and the
    /// secondary one.
    #[error("{cause}, rollback failed: {rollback}")]
    RollbackFailed {
        cause: Box<StorageError>,
        rollback: Box<StorageError>,
    },
}

impl StorageError {
    /// Whether this error (or its original cause, for rollback compositions)
    /// is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::UniqueViolation(_) => true,
            StorageError::RollbackFailed { cause, .. } => cause.is_unique_violation(),
            _ => false,
        }
    }
}

// Implement From for sqlx::Error
impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err)
                if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                StorageError::UniqueViolation(db_err.to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StorageError::Connection(err.to_string())
            }
            _ => StorageError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for BlogError {
    fn from(err: sqlx::Error) -> Self {
        BlogError::Storage(StorageError::from(err))
    }
}

/// Convenient result type for blog server operations
pub type Result<T> = std::result::Result<T, BlogError>;

impl BlogError {
    /// Create a configuration error
    #[inline]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BlogError::Config(msg.into())
    }

    /// Create an invalid-redirect error
    #[inline]
    pub fn invalid_redirect<S: Into<String>>(msg: S) -> Self {
        BlogError::InvalidRedirect(msg.into())
    }

    /// Create a code-exchange error
    #[inline]
    pub fn exchange<S: Into<String>>(msg: S) -> Self {
        BlogError::Exchange(msg.into())
    }

    /// Create a profile-fetch error
    #[inline]
    pub fn profile_fetch<S: Into<String>>(msg: S) -> Self {
        BlogError::ProfileFetch(msg.into())
    }

    /// Create a storage error
    #[inline]
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        BlogError::Storage(StorageError::Database(msg.into()))
    }

    /// Create a permission-denied error
    #[inline]
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        BlogError::PermissionDenied(msg.into())
    }
}
