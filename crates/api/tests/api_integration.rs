//! API integration tests.
//!
//! These run the full router, auth middleware included, against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
};
use blog_api::{AppState, auth_middleware, router as api_router};
use blog_common::config::{AuthConfig, VerificationConfig};
use blog_core::{
    ArticleService, CommentService, EmailService, LikeService, RecoveryService, TokenKind,
    TokenService, UserService, VerificationCodeCache,
};
use blog_db::{
    entities::{post, user},
    repositories::{
        CategoryRepository, CommentRepository, DraftRepository, LikeRepository, PostRepository,
        ReplyRepository, TagRepository, UserRepository,
    },
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase};
use tower::ServiceExt;

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        issuer: "blog".to_string(),
        access_ttl_secs: 3600,
        refresh_ttl_secs: 86_400,
        reset_ttl_secs: 1200,
        max_failed_logins: 5,
    }
}

fn tokens() -> TokenService {
    TokenService::new(&auth_config())
}

fn bearer(user_id: &str) -> String {
    format!("Bearer {}", tokens().issue(user_id, TokenKind::Access).unwrap())
}

/// Build the app the way the server does, over the given mock database.
fn create_test_router(mock: MockDatabase) -> Router {
    let db = Arc::new(mock.into_connection());
    let auth = auth_config();

    let user_repo = UserRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let draft_repo = DraftRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let reply_repo = ReplyRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));

    let article_service = ArticleService::new(
        Arc::clone(&db),
        post_repo.clone(),
        draft_repo.clone(),
        CategoryRepository::new(Arc::clone(&db)),
        TagRepository::new(Arc::clone(&db)),
        comment_repo.clone(),
        reply_repo.clone(),
        like_repo.clone(),
        user_repo.clone(),
    );
    let comment_service = CommentService::new(
        Arc::clone(&db),
        post_repo.clone(),
        comment_repo.clone(),
        reply_repo.clone(),
        like_repo.clone(),
        user_repo.clone(),
    );
    let like_service = LikeService::new(Arc::clone(&db), comment_repo, reply_repo, like_repo);
    let user_service = UserService::new(
        user_repo.clone(),
        post_repo,
        draft_repo,
        tokens(),
        &auth,
    );
    let recovery_service = RecoveryService::new(
        user_repo,
        user_service.clone(),
        VerificationCodeCache::new(&VerificationConfig::default()),
        tokens(),
        EmailService::new(None).unwrap(),
        "http://localhost:3000",
    );

    let state = AppState {
        article_service,
        comment_service,
        like_service,
        user_service,
        recovery_service,
    };

    api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
    maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn test_user(id: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: String::new(),
        bio: String::new(),
        avatar: None,
        failed_login: 0,
        captcha_req_cnt: 0,
        last_activity: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn test_post(id: i64, user_id: &str) -> post::Model {
    post::Model {
        id,
        title: "T".to_string(),
        excerpt: "E".to_string(),
        content: "C".to_string(),
        cover: String::new(),
        views_cnt: 0,
        like_cnt: 0,
        user_id: user_id.to_string(),
        category_id: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_articles_empty() {
    let db = empty_db()
        .append_query_results([Vec::<post::Model>::new()])
        .append_query_results([[count(0)]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles?page=0&per_page=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["articles"], serde_json::json!([]));
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["current_page"], 1);
}

#[tokio::test]
async fn test_missing_article_returns_404() {
    let db = empty_db().append_query_results([Vec::<post::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_my_posts_requires_auth() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles/publish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = create_test_router(empty_db());
    let refresh = tokens().issue("user1", TokenKind::Refresh).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles/drafts")
                .header(header::AUTHORIZATION, format!("Bearer {refresh}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_publish_returns_created() {
    let db = empty_db()
        .append_query_results([[test_user("user1")]])
        .append_query_results([[test_post(7, "user1")]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles/publish")
                .method("POST")
                .header(header::AUTHORIZATION, bearer("user1"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"title":"T","excerpt":"E","content":"C","cover":""}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], 7);
    assert!(body["msg"].is_string());
}

#[tokio::test]
async fn test_publish_rejects_long_title() {
    let db = empty_db().append_query_results([[test_user("user1")]]);
    let app = create_test_router(db);
    let title = "x".repeat(101);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/articles/publish")
                .method("POST")
                .header(header::AUTHORIZATION, bearer("user1"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(format!(r#"{{"title":"{title}"}}"#)))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_profile_of_someone_else_is_forbidden() {
    let db = empty_db().append_query_results([[test_user("user1")]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/user2/profile")
                .header(header::AUTHORIZATION, bearer("user1"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/register")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"username":"al","email":"alice@example.com","password":"password123","bio":"hi"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_with_invalid_json_returns_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login")
                .method("POST")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_reset_form_requires_reset_token() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/reset/not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reset_form_renders() {
    let app = create_test_router(empty_db());
    let token = tokens().issue("user1", TokenKind::Reset).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/auth/reset/{token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("<form"));
}

#[tokio::test]
async fn test_reset_accepts_form_body() {
    let app = create_test_router(empty_db());
    let token = tokens().issue("user1", TokenKind::Reset).unwrap();

    // too short, rejected before the database is touched
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/auth/reset/{token}"))
                .method("POST")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("password=short"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_like_requires_auth() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/comments/3/like")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
