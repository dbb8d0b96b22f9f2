use super::*;
use crate::model::{IdentityProvider, NewPost, NewUser};

fn new_user(email: &str) -> NewUser {
    NewUser {
        identity_provider: IdentityProvider::Github,
        email: email.to_string(),
        username: email.split('@').next().unwrap().to_string(),
        avatar_url: String::new(),
        about_me: String::new(),
    }
}

#[tokio::test]
async fn test_create_and_lookup_user() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut tx = storage.begin().await.unwrap();
    let created = tx.create_user(new_user("kim@example.com"), now).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin().await.unwrap();
    let found = tx
        .get_user_by_email_and_provider("kim@example.com", IdentityProvider::Github)
        .await
        .unwrap()
        .expect("user should be committed");
    tx.rollback().await.unwrap();

    assert_eq!(found.id, created.id);
    assert_eq!(found.username, "kim");
}

#[tokio::test]
async fn test_rollback_discards_writes() {
    let storage = MemoryStorage::new();

    let mut tx = storage.begin().await.unwrap();
    tx.create_user(new_user("kim@example.com"), Utc::now())
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(storage.user_count(), 0);
}

#[tokio::test]
async fn test_commit_enforces_unique_identity() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    // both transactions observe a snapshot without the user
    let mut first = storage.begin().await.unwrap();
    let mut second = storage.begin().await.unwrap();

    first.create_user(new_user("kim@example.com"), now).await.unwrap();
    second.create_user(new_user("kim@example.com"), now).await.unwrap();

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert!(err.is_unique_violation(), "got: {err}");
    assert_eq!(storage.user_count(), 1);
}

#[tokio::test]
async fn test_failed_commit_leaves_state_untouched() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut setup = storage.begin().await.unwrap();
    let author = setup.create_user(new_user("kim@example.com"), now).await.unwrap();
    setup.commit().await.unwrap();

    // stage a post alongside a conflicting user; neither may land
    let mut tx = storage.begin().await.unwrap();
    tx.create_post(
        NewPost {
            user_id: author.id,
            title: "t".into(),
            body: "b".into(),
        },
        now,
    )
    .await
    .unwrap();
    tx.create_user(new_user("kim@example.com"), now).await.unwrap();
    assert!(tx.commit().await.is_err());

    let mut check = storage.begin().await.unwrap();
    assert!(check.list_posts(0, 10).await.unwrap().is_empty());
    check.rollback().await.unwrap();
}

#[tokio::test]
async fn test_snapshot_isolation() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut reader = storage.begin().await.unwrap();

    let mut writer = storage.begin().await.unwrap();
    writer.create_user(new_user("kim@example.com"), now).await.unwrap();
    writer.commit().await.unwrap();

    // the reader began before the writer committed, so it must not see the row
    let found = reader
        .get_user_by_email_and_provider("kim@example.com", IdentityProvider::Github)
        .await
        .unwrap();
    assert!(found.is_none());
    reader.rollback().await.unwrap();
}

#[tokio::test]
async fn test_list_posts_newest_first_with_cursor() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut tx = storage.begin().await.unwrap();
    let author = tx.create_user(new_user("kim@example.com"), now).await.unwrap();
    for i in 0..5 {
        tx.create_post(
            NewPost {
                user_id: author.id,
                title: format!("post {i}"),
                body: String::new(),
            },
            now,
        )
        .await
        .unwrap();
    }
    tx.commit().await.unwrap();

    let mut tx = storage.begin().await.unwrap();
    let first_page = tx.list_posts(0, 2).await.unwrap();
    assert_eq!(first_page.len(), 2);
    assert!(first_page[0].id > first_page[1].id);

    let second_page = tx.list_posts(first_page[1].id, 2).await.unwrap();
    assert_eq!(second_page.len(), 2);
    assert!(second_page[0].id < first_page[1].id);
    tx.rollback().await.unwrap();
}

#[tokio::test]
async fn test_soft_deleted_post_is_invisible() {
    let storage = MemoryStorage::new();
    let now = Utc::now();

    let mut tx = storage.begin().await.unwrap();
    let author = tx.create_user(new_user("kim@example.com"), now).await.unwrap();
    let post = tx
        .create_post(
            NewPost {
                user_id: author.id,
                title: "t".into(),
                body: "b".into(),
            },
            now,
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin().await.unwrap();
    tx.soft_delete_post(post.id, Utc::now()).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = storage.begin().await.unwrap();
    assert!(tx.get_post(post.id).await.unwrap().is_none());
    assert!(tx.list_posts(0, 10).await.unwrap().is_empty());
    tx.rollback().await.unwrap();
}
