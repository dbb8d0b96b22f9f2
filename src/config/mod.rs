//! Configuration for the blog server
//!
//! All values come from the environment (optionally via a .env file loaded
//! in main). Config is read once at startup and injected by value into the
//! components that need it; nothing reads the environment at call sites.

use crate::constants;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub github: GitHubConfig,
    pub token: TokenConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Storage backend configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Driver name (postgres, memory)
    pub driver: String,

    /// Data source name / connection string
    pub dsn: String,
}

/// GitHub OAuth app configuration
///
/// Missing credentials are kept as empty strings rather than failing here:
/// a running process must not crash over them, the provider client reports a
/// configuration error per request instead.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Default redirect registered in the GitHub OAuth app settings
    pub redirect_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub user_api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: String::new(),
            auth_url: constants::GITHUB_AUTH_URL.to_string(),
            token_url: constants::GITHUB_TOKEN_URL.to_string(),
            user_api_url: constants::GITHUB_USER_API_URL.to_string(),
        }
    }
}

/// Session-token configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub signing_secret: String,
    pub ttl_secs: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env_var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(constants::DEFAULT_HTTP_PORT);

        Self {
            server: ServerConfig {
                host: env_var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port,
            },
            storage: StorageConfig {
                driver: env_var("STORAGE_DRIVER").unwrap_or_else(|| "postgres".to_string()),
                dsn: env_var("DATABASE_URL").unwrap_or_default(),
            },
            github: GitHubConfig {
                client_id: env_var("OAUTH_GITHUB_CLIENT_ID").unwrap_or_default(),
                client_secret: env_var("OAUTH_GITHUB_CLIENT_SECRET").unwrap_or_default(),
                redirect_url: env_var("OAUTH_GITHUB_REDIRECT_URL").unwrap_or_default(),
                ..GitHubConfig::default()
            },
            token: TokenConfig {
                signing_secret: env_var("JWT_SIGNING_SECRET").unwrap_or_default(),
                ttl_secs: env_var("TOKEN_TTL_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(constants::DEFAULT_TOKEN_TTL_SECS),
            },
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}
