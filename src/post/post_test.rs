use super::*;
use crate::model::{IdentityProvider, NewUser};
use crate::storage::MemoryStorage;

async fn seed_user(storage: &Arc<MemoryStorage>, email: &str) -> User {
    let mut tx = storage.begin().await.unwrap();
    let user = tx
        .create_user(
            NewUser {
                identity_provider: IdentityProvider::Github,
                email: email.to_string(),
                username: email.split('@').next().unwrap().to_string(),
                avatar_url: String::new(),
                about_me: String::new(),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();
    user
}

#[tokio::test]
async fn test_create_and_get_post() {
    let storage = Arc::new(MemoryStorage::new());
    let author = seed_user(&storage, "kim@example.com").await;
    let svc = PostService::new(storage.clone());

    let (created, creator) = svc
        .create(
            Principal { user_id: author.id },
            "First post".to_string(),
            "Hello".to_string(),
        )
        .await
        .unwrap();
    assert_eq!(creator.id, author.id);
    assert_eq!(created.likes, 0);

    let (fetched, fetched_author) = svc.get(created.id).await.unwrap();
    assert_eq!(fetched.title, "First post");
    assert_eq!(fetched_author.id, author.id);
}

#[tokio::test]
async fn test_create_without_user_row_is_not_found() {
    let storage = Arc::new(MemoryStorage::new());
    let svc = PostService::new(storage);

    let err = svc
        .create(Principal { user_id: 999 }, "t".to_string(), "b".to_string())
        .await
        .unwrap_err();
    assert!(
        matches!(err, BlogError::Storage(StorageError::NotFound(_))),
        "got: {err}"
    );
}

#[tokio::test]
async fn test_list_walks_pages_newest_first() {
    let storage = Arc::new(MemoryStorage::new());
    let author = seed_user(&storage, "kim@example.com").await;
    let svc = PostService::new(storage);

    for i in 0..5 {
        svc.create(
            Principal { user_id: author.id },
            format!("post {i}"),
            String::new(),
        )
        .await
        .unwrap();
    }

    let (first_page, cursor) = svc.list("", 2).await.unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].title, "post 4");
    let cursor = cursor.expect("more pages remain");

    let (second_page, cursor) = svc.list(&cursor, 2).await.unwrap();
    assert_eq!(second_page.len(), 2);
    assert_eq!(second_page[0].title, "post 2");
    let cursor = cursor.expect("one more page remains");

    let (last_page, cursor) = svc.list(&cursor, 2).await.unwrap();
    assert_eq!(last_page.len(), 1);
    assert_eq!(last_page[0].title, "post 0");
    assert!(cursor.is_none());
}

#[tokio::test]
async fn test_garbage_cursor_starts_from_newest() {
    let storage = Arc::new(MemoryStorage::new());
    let author = seed_user(&storage, "kim@example.com").await;
    let svc = PostService::new(storage);

    svc.create(Principal { user_id: author.id }, "only".to_string(), String::new())
        .await
        .unwrap();

    let (posts, _) = svc.list("!!garbage!!", 10).await.unwrap();
    assert_eq!(posts.len(), 1);
}

#[tokio::test]
async fn test_only_author_may_delete() {
    let storage = Arc::new(MemoryStorage::new());
    let author = seed_user(&storage, "kim@example.com").await;
    let other = seed_user(&storage, "lee@example.com").await;
    let svc = PostService::new(storage);

    let (post, _) = svc
        .create(
            Principal { user_id: author.id },
            "t".to_string(),
            "b".to_string(),
        )
        .await
        .unwrap();

    let err = svc
        .delete(Principal { user_id: other.id }, post.id)
        .await
        .unwrap_err();
    assert!(matches!(err, BlogError::PermissionDenied(_)), "got: {err}");

    svc.delete(Principal { user_id: author.id }, post.id)
        .await
        .unwrap();

    let err = svc.get(post.id).await.unwrap_err();
    assert!(
        matches!(err, BlogError::Storage(StorageError::NotFound(_))),
        "got: {err}"
    );
}
