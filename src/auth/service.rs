//! Login orchestration
//!
//! Composes the provider registry, the reconciler, and token issuance into
//! the flow the transport handlers expose. A login either yields a signed
//! token (and, for a first login, a committed user row) or nothing; no
//! partial session is ever issued.

use super::reconcile::UserReconciler;
use super::registry::ProviderRegistry;
use super::token::SessionTokens;
use crate::Result;
use crate::model::{IdentityProvider, User};
use crate::storage::Storage;
use chrono::Utc;
use std::sync::Arc;
use url::Url;

/// Result of a completed login
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub is_new_user: bool,
    pub user: User,
}

/// Authentication service exposed to transport handlers
#[derive(Clone)]
pub struct AuthService {
    registry: Arc<ProviderRegistry>,
    reconciler: UserReconciler,
    tokens: Arc<SessionTokens>,
}

impl AuthService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        storage: Arc<dyn Storage>,
        tokens: Arc<SessionTokens>,
    ) -> Self {
        Self {
            registry,
            reconciler: UserReconciler::new(storage),
            tokens,
        }
    }

    /// Build the authorization URL the browser is sent to
    pub fn get_auth_url(
        &self,
        provider: IdentityProvider,
        redirect_override: Option<&Url>,
    ) -> Result<String> {
        let app = self.registry.resolve(provider)?;
        app.auth_url(redirect_override)
    }

    /// Complete a login: exchange the code, fetch the profile, reconcile the
    /// user, and issue a session token.
    ///
    /// Any stage failure aborts the flow with no session issued. A user row
    /// committed before a token-issuance failure stays valid; the caller
    /// retries the login rather than treating the user as missing.
    pub async fn complete_login(
        &self,
        provider: IdentityProvider,
        code: &str,
        redirect_override: Option<&Url>,
    ) -> Result<LoginOutcome> {
        let app = self.registry.resolve(provider)?;

        tracing::debug!(provider = %provider, "exchanging temporary code for access token");
        let access_token = app.exchange_code(code, redirect_override).await?;
        let profile = app.fetch_profile(&access_token).await?;

        let (user, is_new_user) = self.reconciler.reconcile(&profile, provider).await?;

        let token = self.tokens.issue(user.id, Utc::now())?;

        Ok(LoginOutcome {
            token,
            is_new_user,
            user,
        })
    }

    /// End a session. Stateless tokens cannot be revoked server-side, so
    /// this only exists for transport symmetry; clients drop the cookie.
    pub async fn logout(&self) -> Result<()> {
        Ok(())
    }
}
