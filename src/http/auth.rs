//! Authentication endpoints
//!
//! JSON handlers for the auth service plus the browser-facing OAuth
//! callback. The callback never surfaces a transport error: the caller is a
//! browser mid-redirect, so failures bounce back to the target with error
//! query parameters instead.

use super::{AppError, AppState};
use crate::auth::{clear_session_cookie, session_cookie};
use crate::model::IdentityProvider;
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Deserialize)]
pub struct GetAuthUrlRequest {
    pub identity_provider: IdentityProvider,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetAuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identity_provider: IdentityProvider,
    pub code: String,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub is_new_user: bool,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub redirect_uri: String,
}

/// POST /api/v1/auth/url
pub async fn get_auth_url(
    State(state): State<AppState>,
    Json(req): Json<GetAuthUrlRequest>,
) -> Result<Json<GetAuthUrlResponse>, AppError> {
    let redirect = parse_redirect(req.redirect_url.as_deref())?;
    let auth_url = state
        .auth
        .get_auth_url(req.identity_provider, redirect.as_ref())?;
    Ok(Json(GetAuthUrlResponse { auth_url }))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let redirect = parse_redirect(req.redirect_url.as_deref())?;
    let outcome = state
        .auth
        .complete_login(req.identity_provider, &req.code, redirect.as_ref())
        .await?;

    let cookie = session_cookie(&outcome.token);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token: outcome.token,
            is_new_user: outcome.is_new_user,
        }),
    )
        .into_response())
}

/// POST /api/v1/auth/logout
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    state.auth.logout().await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({})),
    )
        .into_response())
}

/// GET /oauth/github/callback
///
/// The provider redirects the browser here with the temporary code. The
/// code exchange always uses the configured default redirect; the
/// `redirect_uri` query parameter is only where the browser goes next.
pub async fn github_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let target = params.redirect_uri;

    match state
        .auth
        .complete_login(IdentityProvider::Github, &params.code, None)
        .await
    {
        Ok(outcome) => (
            [(header::SET_COOKIE, session_cookie(&outcome.token))],
            Redirect::permanent(&target),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "github oauth callback failed");
            Redirect::permanent(&error_redirect(&target, &err.to_string())).into_response()
        }
    }
}

/// Append status=error&message=<reason> to the bounce target
fn error_redirect(target: &str, message: &str) -> String {
    match Url::parse(target) {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("status", "error")
                .append_pair("message", message);
            url.to_string()
        }
        Err(_) => target.to_string(),
    }
}

fn parse_redirect(raw: Option<&str>) -> Result<Option<Url>, AppError> {
    match raw {
        None => Ok(None),
        Some(raw) => Url::parse(raw)
            .map(Some)
            .map_err(|e| AppError(crate::BlogError::invalid_redirect(format!("{raw}: {e}")))),
    }
}
