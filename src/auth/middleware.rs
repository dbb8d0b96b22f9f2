//! Request authentication interceptor
//!
//! Runs before protected handlers: extracts a session token from the
//! Authorization header (preferred) or the session cookie, validates it, and
//! attaches the resolved principal to the request. A request without a token
//! passes through unauthenticated; handlers that require a principal reject
//! its absence themselves via the `Principal` extractor.

use super::token::SessionTokens;
use crate::constants;
use crate::error::BlogError;
use crate::http::AppError;
use crate::model::Principal;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

/// Authentication middleware.
///
/// Terminal states per request: pass-through (no token), authenticated
/// (principal attached), or rejected. Malformed tokens are classified as an
/// internal error to distinguish a corrupted or incompatible token from a
/// plain unauthenticated caller; every other validation failure is a 401.
pub async fn authenticate(
    State(tokens): State<Arc<SessionTokens>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(raw) = extract_token(req.headers()) else {
        return next.run(req).await;
    };

    match tokens.validate(&raw, Utc::now()) {
        Ok(user_id) => {
            req.extensions_mut().insert(Principal { user_id });
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "rejecting request token");
            AppError::from(BlogError::Token(err)).into_response()
        }
    }
}

/// Extract a session token: bearer header first, session cookie second
fn extract_token(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Token from the session cookie
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(|c| c.trim())
        .filter_map(|c| c.split_once('='))
        .find(|(name, _)| *name == constants::SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Extractor for handlers that require an authenticated caller
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>> + Send {
        let principal = parts.extensions.get::<Principal>().copied();
        async move {
            principal.ok_or((
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ))
        }
    }
}

/// Session cookie set after a successful browser login
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        constants::SESSION_COOKIE,
        token,
        constants::DEFAULT_TOKEN_TTL_SECS
    )
}

/// Clear the session cookie
pub fn clear_session_cookie() -> String {
    format!(
        "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
        constants::SESSION_COOKIE
    )
}
