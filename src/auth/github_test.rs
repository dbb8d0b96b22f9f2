use crate::BlogError;
use crate::auth::github::GitHubApp;
use crate::auth::provider::OAuthApp;
use crate::config::GitHubConfig;
use std::collections::HashMap;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> GitHubConfig {
    GitHubConfig {
        client_id: "abc123".to_string(),
        client_secret: "shhh".to_string(),
        redirect_url: "http://localhost:8080/oauth/github/callback".to_string(),
        ..GitHubConfig::default()
    }
}

fn query_map(raw: &str) -> HashMap<String, String> {
    Url::parse(raw)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[test]
fn test_auth_url_contains_required_params() {
    let app = GitHubApp::new(test_config()).unwrap();
    let url = app.auth_url(None).unwrap();

    let params = query_map(&url);
    assert_eq!(params.get("client_id").map(String::as_str), Some("abc123"));
    assert_eq!(params.get("scope").map(String::as_str), Some("user"));
    assert!(
        !params.get("state").unwrap_or(&String::new()).is_empty(),
        "state must be non-empty: {url}"
    );
}

#[test]
fn test_auth_url_uses_injected_state_generator() {
    let app = GitHubApp::new(test_config())
        .unwrap()
        .with_state_fn(std::sync::Arc::new(|| "fixed-state".to_string()));

    let params = query_map(&app.auth_url(None).unwrap());
    assert_eq!(params.get("state").map(String::as_str), Some("fixed-state"));
}

#[test]
fn test_auth_url_state_is_fresh_per_call() {
    let app = GitHubApp::new(test_config()).unwrap();
    let first = query_map(&app.auth_url(None).unwrap());
    let second = query_map(&app.auth_url(None).unwrap());
    assert_ne!(first.get("state"), second.get("state"));
}

#[test]
fn test_auth_url_accepts_matching_redirect_override() {
    let app = GitHubApp::new(test_config()).unwrap();
    let override_url = Url::parse("http://localhost:8080/after-login").unwrap();
    let url = app.auth_url(Some(&override_url)).unwrap();

    let params = query_map(&url);
    assert_eq!(
        params.get("redirect_uri").map(String::as_str),
        Some("http://localhost:8080/after-login")
    );
}

#[test]
fn test_auth_url_rejects_foreign_redirect_override() {
    let app = GitHubApp::new(test_config()).unwrap();

    for bad in [
        "http://evil.example.com:8080/cb", // host mismatch
        "http://localhost:9999/cb",        // port mismatch
    ] {
        let override_url = Url::parse(bad).unwrap();
        let err = app.auth_url(Some(&override_url)).unwrap_err();
        assert!(matches!(err, BlogError::InvalidRedirect(_)), "{bad}: {err}");
    }
}

#[test]
fn test_auth_url_without_credentials_is_config_error() {
    let config = GitHubConfig {
        client_id: String::new(),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();
    let err = app.auth_url(None).unwrap_err();
    assert!(matches!(err, BlogError::Config(_)), "got: {err}");
}

#[tokio::test]
async fn test_exchange_code_returns_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "gho_test_token",
            "token_type": "bearer",
            "scope": "user",
        })))
        .mount(&server)
        .await;

    let config = GitHubConfig {
        token_url: format!("{}/login/oauth/access_token", server.uri()),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();

    let token = app.exchange_code("tmp-code", None).await.unwrap();
    assert_eq!(token, "gho_test_token");
}

#[tokio::test]
async fn test_exchange_code_non_2xx_is_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login/oauth/access_token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let config = GitHubConfig {
        token_url: format!("{}/login/oauth/access_token", server.uri()),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();

    let err = app.exchange_code("tmp-code", None).await.unwrap_err();
    assert!(matches!(err, BlogError::Exchange(_)), "got: {err}");
}

#[tokio::test]
async fn test_fetch_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "email": "octocat@example.com",
            "name": "The Octocat",
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
        })))
        .mount(&server)
        .await;

    let config = GitHubConfig {
        user_api_url: format!("{}/user", server.uri()),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();

    let profile = app.fetch_profile("gho_test_token").await.unwrap();
    assert_eq!(profile.email, "octocat@example.com");
    assert_eq!(profile.display_name, "The Octocat");
    assert_eq!(
        profile.avatar_url,
        "https://avatars.githubusercontent.com/u/583231"
    );
}

#[tokio::test]
async fn test_fetch_profile_non_2xx_is_profile_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let config = GitHubConfig {
        user_api_url: format!("{}/user", server.uri()),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();

    let err = app.fetch_profile("expired").await.unwrap_err();
    assert!(matches!(err, BlogError::ProfileFetch(_)), "got: {err}");
}

#[tokio::test]
async fn test_fetch_profile_malformed_json_is_profile_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let config = GitHubConfig {
        user_api_url: format!("{}/user", server.uri()),
        ..test_config()
    };
    let app = GitHubApp::new(config).unwrap();

    let err = app.fetch_profile("gho_test_token").await.unwrap_err();
    assert!(matches!(err, BlogError::ProfileFetch(_)), "got: {err}");
}
