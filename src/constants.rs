//! Constants used throughout the blog server
//!
//! Endpoint URLs, token parameters, and cookie/header names live here so the
//! auth and http layers agree on them.

// ============================================================================
// SESSION TOKENS
// ============================================================================

/// Issuer claim stamped into every session token
pub const TOKEN_ISSUER: &str = "techblog";

/// Default session token lifetime in seconds (1 hour)
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Cookie carrying the session token when the Authorization header is absent
pub const SESSION_COOKIE: &str = "token";

// ============================================================================
// IDENTITY PROVIDERS
// ============================================================================

/// GitHub authorization endpoint
pub const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";

/// GitHub code-exchange endpoint
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// GitHub authenticated-user API endpoint
pub const GITHUB_USER_API_URL: &str = "https://api.github.com/user";

/// OAuth scopes requested from GitHub
/// https://docs.github.com/en/apps/oauth-apps/building-oauth-apps/scopes-for-oauth-apps
pub const GITHUB_SCOPES: &[&str] = &["user"];

// ============================================================================
// HTTP
// ============================================================================

/// Default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Timeout for outbound identity-provider calls, in seconds
pub const PROVIDER_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default page size for post listings
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size for post listings
pub const MAX_PAGE_SIZE: i64 = 100;
