//! Identity-provider capability set
//!
//! One trait per concern the login flow needs from a provider: building the
//! authorization URL, exchanging the temporary code, and fetching the user
//! profile. Adding a provider means implementing this trait and registering
//! the client; shared logic never branches on the provider identity.

use crate::Result;
use crate::model::IdentityProfile;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Capability set of one OAuth identity provider
#[async_trait]
pub trait OAuthApp: Send + Sync + std::fmt::Debug {
    /// Build the URL the browser is redirected to for authorization.
    ///
    /// The URL carries the client id, the scope list, and a freshly
    /// generated `state` value. A redirect override must match the host and
    /// port of the provider's configured default redirect.
    fn auth_url(&self, redirect_override: Option<&Url>) -> Result<String>;

    /// Exchange a temporary authorization code for an access token.
    async fn exchange_code(&self, code: &str, redirect_override: Option<&Url>)
    -> Result<String>;

    /// Fetch the authenticated user's profile with the access token.
    async fn fetch_profile(&self, access_token: &str) -> Result<IdentityProfile>;
}

/// Generator for the OAuth `state` parameter; injectable for tests
pub type StateFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Default `state` generator: a random UUID per issuance
pub fn random_state() -> StateFn {
    Arc::new(|| Uuid::new_v4().to_string())
}
