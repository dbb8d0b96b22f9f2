//! Provider registry
//!
//! Maps an identity-provider identifier to its OAuth client. Registration is
//! append-only and first-write-wins: a second registration under an
//! already-used key is a no-op, never an overwrite, so a configuration race
//! cannot swap credentials mid-process. After startup the registry is
//! read-only and shared across requests.

use super::provider::OAuthApp;
use crate::model::IdentityProvider;
use crate::{BlogError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of configured identity providers
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    apps: HashMap<IdentityProvider, Arc<dyn OAuthApp>>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client for a provider. The first registration for a key
    /// wins; later ones are ignored.
    pub fn register(mut self, provider: IdentityProvider, app: Arc<dyn OAuthApp>) -> Self {
        self.apps.entry(provider).or_insert(app);
        self
    }

    /// Resolve the client for a provider
    pub fn resolve(&self, provider: IdentityProvider) -> Result<Arc<dyn OAuthApp>> {
        match provider {
            IdentityProvider::Unspecified => Err(BlogError::UnspecifiedProvider),
            p => self
                .apps
                .get(&p)
                .cloned()
                .ok_or_else(|| BlogError::UnsupportedProvider(p.to_string())),
        }
    }
}
