//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p blog-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `blog_test`)
//!   `TEST_DB_PASSWORD` (default: `blog_test`)
//!   `TEST_DB_NAME` (default: `blog_test`)

#![allow(clippy::unwrap_used)]

use blog_db::entities::{comment, draft, post, user};
use blog_db::repositories::{
    CommentRepository, DraftRepository, PostRepository, TagRepository, UserRepository,
};
use blog_db::test_utils::{TestDatabase, TestDbConfig};
use blog_db::{TagTarget, transaction};
use chrono::Utc;
use sea_orm::Set;

async fn seed_user(users: &UserRepository, id: &str) -> user::Model {
    users
        .create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(format!("user_{id}")),
            email: Set(format!("{id}@example.com")),
            password_hash: Set("hash".to_string()),
            bio: Set(String::new()),
            avatar: Set(None),
            failed_login: Set(0),
            captcha_req_cnt: Set(0),
            last_activity: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap()
}

fn new_post(user_id: &str, title: &str) -> post::ActiveModel {
    post::ActiveModel {
        title: Set(title.to_string()),
        excerpt: Set(String::new()),
        content: Set("body".to_string()),
        cover: Set(String::new()),
        views_cnt: Set(0),
        like_cnt: Set(0),
        user_id: Set(user_id.to_string()),
        category_id: Set(None),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let result = TestDatabase::with_config(TestDbConfig::default()).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleting_post_cascades_comments() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();

    let users = UserRepository::new(conn.clone());
    let posts = PostRepository::new(conn.clone());
    let comments = CommentRepository::new(conn.clone());

    seed_user(&users, "u1").await;
    let post = posts
        .create_with(conn.as_ref(), new_post("u1", "T"))
        .await
        .unwrap();

    comments
        .create_with(
            conn.as_ref(),
            comment::ActiveModel {
                content: Set("first".to_string()),
                like_cnt: Set(0),
                post_id: Set(post.id),
                user_id: Set("u1".to_string()),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(comments.count_by_post(post.id).await.unwrap(), 1);

    posts.delete_with(conn.as_ref(), post.id).await.unwrap();
    assert_eq!(comments.count_by_post(post.id).await.unwrap(), 0);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_tag_find_or_create_is_case_insensitive() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();
    let tags = TagRepository::new(conn.clone());

    let first = tags.get_or_create_with(conn.as_ref(), "go").await.unwrap();
    let second = tags.get_or_create_with(conn.as_ref(), "Go").await.unwrap();
    assert_eq!(first.id, second.id);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_rolled_back_transaction_leaves_no_rows() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();

    let users = UserRepository::new(conn.clone());
    let posts = PostRepository::new(conn.clone());
    let tags = TagRepository::new(conn.clone());
    seed_user(&users, "u1").await;

    let txn = transaction::begin(conn.as_ref()).await.unwrap();
    let work = async {
        let post = posts.create_with(&txn, new_post("u1", "T")).await?;
        let tag = tags.get_or_create_with(&txn, "a").await?;
        tags.attach_with(&txn, TagTarget::Post(post.id), tag.id)
            .await?;
        Err::<i64, _>(blog_common::AppError::Internal("abort".to_string()))
    }
    .await;
    assert!(transaction::finish(txn, work).await.is_err());

    assert_eq!(posts.count().await.unwrap(), 0);
    assert!(tags.find_by_name("a").await.unwrap().is_none());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleting_unlinked_draft_leaves_posts() {
    let db = TestDatabase::create_unique().await.unwrap();
    let conn = db.shared();

    let users = UserRepository::new(conn.clone());
    let posts = PostRepository::new(conn.clone());
    let drafts = DraftRepository::new(conn.clone());
    seed_user(&users, "u1").await;

    posts
        .create_with(conn.as_ref(), new_post("u1", "kept"))
        .await
        .unwrap();
    let draft = drafts
        .create_with(
            conn.as_ref(),
            draft::ActiveModel {
                title: Set("D".to_string()),
                excerpt: Set(String::new()),
                content: Set(String::new()),
                cover: Set(String::new()),
                user_id: Set("u1".to_string()),
                category_id: Set(None),
                post_id: Set(None),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    drafts.delete_with(conn.as_ref(), draft.id).await.unwrap();

    assert_eq!(drafts.count_by_user("u1").await.unwrap(), 0);
    assert_eq!(posts.count_by_user("u1").await.unwrap(), 1);

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.database.is_empty());
}
