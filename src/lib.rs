//! techblog - blog backend server
//!
//! A small blog API where end users log in through third-party OAuth
//! identity providers. The server exchanges the provider's temporary code
//! for a profile, reconciles it with a local user row, and issues a signed
//! stateless session token; protected post endpoints are gated by a
//! request-level authentication interceptor.
//!
//! # Architecture
//!
//! - `auth` - provider clients, registry, reconciler, tokens, interceptor
//! - `storage` - transactional storage trait with Postgres and in-memory backends
//! - `post` - blog-post CRUD over the storage trait
//! - `http` - axum router, error mapping, server startup
//! - `config` - environment-sourced configuration, injected at construction

// Core modules
pub mod constants;
pub mod error;
pub mod model;

// Domain
pub mod auth;
pub mod post;

// Infrastructure
pub mod config;
pub mod cursor;
pub mod storage;

// Interface layers
pub mod cli;
pub mod http;

// Re-exports for convenience
pub use error::{BlogError, Result};
pub use model::{IdentityProvider, Post, Principal, User};

/// Initialize logging for the application
pub fn init_logging() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "techblog=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
