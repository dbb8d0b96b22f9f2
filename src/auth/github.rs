//! GitHub OAuth identity provider
//!
//! Implements the provider capability set against GitHub's OAuth app flow.
//! https://docs.github.com/en/apps/oauth-apps/building-oauth-apps/authorizing-oauth-apps

use super::provider::{OAuthApp, StateFn, random_state};
use crate::config::GitHubConfig;
use crate::constants;
use crate::model::IdentityProfile;
use crate::{BlogError, Result};
use async_trait::async_trait;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl, basic::BasicClient,
};
use reqwest::header;
use serde::Deserialize;
use url::Url;

/// GitHub OAuth app client
pub struct GitHubApp {
    config: GitHubConfig,
    http_client: reqwest::Client,
    rand_state: StateFn,
}

impl std::fmt::Debug for GitHubApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApp")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GitHubApp {
    /// Create a new GitHub client from provider configuration
    pub fn new(config: GitHubConfig) -> Result<Self> {
        // Disable redirects to prevent authorization code interception
        let http_client = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(
                constants::PROVIDER_HTTP_TIMEOUT_SECS,
            ))
            .build()
            .map_err(|e| BlogError::config(format!("building HTTP client for OAuth: {e}")))?;

        Ok(Self {
            config,
            http_client,
            rand_state: random_state(),
        })
    }

    /// Replace the `state` generator (tests)
    pub fn with_state_fn(mut self, rand_state: StateFn) -> Self {
        self.rand_state = rand_state;
        self
    }

    /// Credentials are allowed to be missing at startup; every call reports
    /// it as a configuration error instead of crashing the process.
    fn ensure_credentials(&self) -> Result<()> {
        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(BlogError::config(
                "github oauth credentials are not configured",
            ));
        }
        Ok(())
    }

    /// Resolve the redirect for this call: a validated override, or the
    /// provider's configured default.
    fn resolve_redirect(&self, redirect_override: Option<&Url>) -> Result<String> {
        match redirect_override {
            Some(u) => {
                self.validate_redirect(u)?;
                Ok(u.to_string())
            }
            None if self.config.redirect_url.is_empty() => {
                Err(BlogError::config("github redirect URL is not configured"))
            }
            None => Ok(self.config.redirect_url.clone()),
        }
    }

    fn validate_redirect(&self, u: &Url) -> Result<()> {
        // default redirect url configured in the GitHub oauth app settings
        let configured = Url::parse(&self.config.redirect_url)
            .map_err(|e| BlogError::config(format!("configured redirect URL: {e}")))?;
        if configured.host_str() != u.host_str() || configured.port() != u.port() {
            return Err(BlogError::invalid_redirect(format!(
                "redirect url \"{u}\"'s host and port must match the configured oauth app settings"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OAuthApp for GitHubApp {
    fn auth_url(&self, redirect_override: Option<&Url>) -> Result<String> {
        self.ensure_credentials()?;
        let redirect = self.resolve_redirect(redirect_override)?;

        // Note: can't extract the client build to a helper due to oauth2's
        // typestate pattern
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(self.config.auth_url.clone())
                    .map_err(|e| BlogError::config(format!("invalid auth URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(self.config.token_url.clone())
                    .map_err(|e| BlogError::config(format!("invalid token URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect).map_err(|e| BlogError::invalid_redirect(e.to_string()))?,
            );

        // TODO: persist the issued state keyed by a short-lived server-side
        // token and reject callbacks whose state does not match
        let state = (self.rand_state)();
        let (auth_url, _csrf) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(
                constants::GITHUB_SCOPES
                    .iter()
                    .map(|s| Scope::new(s.to_string())),
            )
            .url();

        Ok(auth_url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_override: Option<&Url>,
    ) -> Result<String> {
        self.ensure_credentials()?;
        let redirect = self.resolve_redirect(redirect_override)?;

        // Note: can't extract the client build to a helper due to oauth2's
        // typestate pattern
        let client = BasicClient::new(ClientId::new(self.config.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.config.client_secret.clone()))
            .set_auth_uri(
                AuthUrl::new(self.config.auth_url.clone())
                    .map_err(|e| BlogError::config(format!("invalid auth URL: {e}")))?,
            )
            .set_token_uri(
                TokenUrl::new(self.config.token_url.clone())
                    .map_err(|e| BlogError::config(format!("invalid token URL: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect).map_err(|e| BlogError::invalid_redirect(e.to_string()))?,
            );

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| BlogError::exchange(e.to_string()))?;

        Ok(token.access_token().secret().clone())
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<IdentityProfile> {
        let resp = self
            .http_client
            .get(&self.config.user_api_url)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, "techblog")
            .send()
            .await
            .map_err(|e| BlogError::profile_fetch(format!("requesting github user: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BlogError::profile_fetch(format!("reading response body: {e}")))?;

        if !status.is_success() {
            return Err(BlogError::profile_fetch(format!(
                "requesting user status: {status} body: {body}"
            )));
        }

        #[derive(Deserialize)]
        struct GitHubUser {
            #[serde(default)]
            email: Option<String>,
            #[serde(default)]
            name: Option<String>,
            #[serde(default)]
            avatar_url: String,
        }

        let user: GitHubUser = serde_json::from_str(&body)
            .map_err(|e| BlogError::profile_fetch(format!("unmarshalling json: {e}")))?;

        Ok(IdentityProfile {
            email: user.email.unwrap_or_default(),
            display_name: user.name.unwrap_or_default(),
            avatar_url: user.avatar_url,
        })
    }
}
