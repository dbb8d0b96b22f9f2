use super::*;
use crate::error::{StorageError, TokenError};
use crate::storage::MemoryStorage;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceExt;

fn test_state() -> AppState {
    let storage = std::sync::Arc::new(MemoryStorage::new());
    let tokens = Arc::new(SessionTokens::new("http-test-secret"));
    let registry = Arc::new(ProviderRegistry::new());
    AppState {
        auth: Arc::new(AuthService::new(registry, storage.clone(), tokens.clone())),
        posts: Arc::new(crate::post::PostService::new(storage)),
        tokens,
    }
}

fn test_app() -> Router {
    build_router(
        test_state(),
        &ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        },
    )
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn test_error_status_mapping() {
    let cases: Vec<(BlogError, StatusCode)> = vec![
        (BlogError::UnspecifiedProvider, StatusCode::BAD_REQUEST),
        (
            BlogError::UnsupportedProvider("github".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            BlogError::InvalidRedirect("bad".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            BlogError::Token(TokenError::Expired),
            StatusCode::UNAUTHORIZED,
        ),
        (
            BlogError::Token(TokenError::SignatureInvalid),
            StatusCode::UNAUTHORIZED,
        ),
        (
            BlogError::Token(TokenError::Malformed("oops".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            BlogError::Token(TokenError::Signing("no secret".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            BlogError::Storage(StorageError::NotFound("post 9".into())),
            StatusCode::NOT_FOUND,
        ),
        (
            BlogError::Storage(StorageError::Database("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            BlogError::Exchange("status 502".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            BlogError::PermissionDenied("not yours".into()),
            StatusCode::FORBIDDEN,
        ),
    ];

    for (err, expected) in cases {
        let msg = err.to_string();
        let resp = AppError(err).into_response();
        assert_eq!(resp.status(), expected, "{msg}");
    }
}

#[tokio::test]
async fn test_internal_errors_are_sanitized() {
    let resp = AppError(BlogError::Exchange("secret-ish provider body".into())).into_response();
    let body = body_json(resp).await;
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("secret-ish"), "leaked: {message}");
}

#[tokio::test]
async fn test_healthz() {
    let resp = test_app()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_auth_url_with_unspecified_provider_is_invalid_argument() {
    let req = Request::post("/api/v1/auth/url")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"identity_provider": "unspecified"}).to_string(),
        ))
        .unwrap();

    let resp = test_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["type"], "invalid_argument");
}

#[tokio::test]
async fn test_list_posts_is_open() {
    let resp = test_app()
        .oneshot(Request::get("/api/v1/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["posts"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_post_requires_principal() {
    let req = Request::post("/api/v1/posts")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({"title": "t", "body": "b"}).to_string(),
        ))
        .unwrap();

    let resp = test_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
