//! HTTP server for the blog backend
//!
//! Builds the axum router, maps the error taxonomy onto transport status
//! codes in one place, and owns server startup.

pub mod auth;
pub mod posts;

use crate::auth::{AuthService, GitHubApp, ProviderRegistry, SessionTokens};
use crate::config::{Config, ServerConfig};
use crate::error::{StorageError, TokenError};
use crate::model::IdentityProvider;
use crate::post::PostService;
use crate::{BlogError, Result};
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub posts: Arc<PostService>,
    pub tokens: Arc<SessionTokens>,
}

/// Error type for HTTP handlers
///
/// Maps the taxonomy to status codes: invalid argument for bad provider or
/// redirect input, unauthenticated for token rejections, internal for
/// everything else. Internal causes are logged in full and never leaked to
/// the caller.
#[derive(Debug)]
pub struct AppError(pub BlogError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self.0 {
            BlogError::UnspecifiedProvider | BlogError::UnsupportedProvider(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                self.0.to_string(),
            ),
            BlogError::InvalidRedirect(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_argument",
                self.0.to_string(),
            ),
            BlogError::PermissionDenied(_) => (
                StatusCode::FORBIDDEN,
                "permission_denied",
                self.0.to_string(),
            ),
            BlogError::Storage(StorageError::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("not found: {what}"),
            ),
            // a malformed token is a corrupted or incompatible credential,
            // not a plain unauthenticated caller
            BlogError::Token(TokenError::Malformed(_) | TokenError::Signing(_)) => {
                tracing::error!("token error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            BlogError::Token(_) => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                self.0.to_string(),
            ),
            _ => {
                tracing::error!("internal error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "status": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<BlogError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let storage = crate::storage::create_storage_from_config(&config.storage).await?;

    let tokens = Arc::new(
        SessionTokens::new(config.token.signing_secret.clone())
            .with_ttl(chrono::Duration::seconds(config.token.ttl_secs)),
    );

    let registry = Arc::new(
        ProviderRegistry::new().register(
            IdentityProvider::Github,
            Arc::new(GitHubApp::new(config.github.clone())?),
        ),
    );

    let state = AppState {
        auth: Arc::new(AuthService::new(registry, storage.clone(), tokens.clone())),
        posts: Arc::new(PostService::new(storage)),
        tokens,
    };

    let app = build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let socket_addr: SocketAddr = addr
        .parse()
        .map_err(|e| BlogError::config(format!("invalid address {addr}: {e}")))?;

    tracing::info!("starting HTTP server on {}", socket_addr);

    let listener = tokio::net::TcpListener::bind(socket_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BlogError::config(format!("server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutting down");
}

/// Build the router with all endpoints
pub fn build_router(state: AppState, server_config: &ServerConfig) -> Router {
    let tokens = state.tokens.clone();

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/v1/auth/url", post(auth::get_auth_url))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/oauth/github/callback", get(auth::github_callback))
        .route(
            "/api/v1/posts",
            post(posts::create_post).get(posts::list_posts),
        )
        .route(
            "/api/v1/posts/{id}",
            get(posts::get_post).delete(posts::delete_post),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Authentication interceptor; attaches the principal when a
                // valid token is present
                .layer(axum::middleware::from_fn_with_state(
                    tokens,
                    crate::auth::middleware::authenticate,
                ))
                // Tracing layer for request/response logging
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new())
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Micros),
                        ),
                )
                // CORS layer for the browser frontend (restrictive policy)
                .layer({
                    let origin_localhost =
                        format!("http://localhost:{}", server_config.port)
                            .parse::<axum::http::HeaderValue>()
                            .expect("valid header value");
                    let origin_127 = format!("http://127.0.0.1:{}", server_config.port)
                        .parse::<axum::http::HeaderValue>()
                        .expect("valid header value");

                    CorsLayer::new()
                        .allow_origin([origin_localhost, origin_127])
                        .allow_methods([
                            axum::http::Method::GET,
                            axum::http::Method::POST,
                            axum::http::Method::DELETE,
                            axum::http::Method::OPTIONS,
                        ])
                        .allow_headers([
                            axum::http::header::CONTENT_TYPE,
                            axum::http::header::AUTHORIZATION,
                        ])
                        .allow_credentials(true)
                }),
        )
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod http_test;
