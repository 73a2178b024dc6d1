//! Article endpoints: listing, reading, publishing and deleting.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use blog_common::{AppResult, Pagination};
use blog_core::{
    ArticleInput, CommentView, CreateCommentInput, CreateReplyInput, DraftDetail, DraftSummary,
    PostDetail, PostSummary, ReplyView,
};
use serde::Serialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, Created, Message, message},
};

#[derive(Serialize)]
pub struct ArticleList {
    pub articles: Vec<PostSummary>,
    pub total: u64,
    pub current_page: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedList {
    pub published_articles: Vec<PostSummary>,
    pub total: u64,
    #[serde(rename = "current_page")]
    pub current_page: u64,
}

#[derive(Serialize)]
pub struct DraftList {
    pub drafts: Vec<DraftSummary>,
    pub total: u64,
    pub current_page: u64,
}

#[derive(Serialize)]
pub struct ArticleEnvelope<T> {
    pub article: T,
}

#[derive(Serialize)]
pub struct CommentList {
    pub comments: Vec<CommentView>,
}

#[derive(Serialize)]
pub struct ReplyList {
    pub replies: Vec<ReplyView>,
}

/// All posts, newest first.
async fn list(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<ApiResponse<ArticleList>> {
    let page = state.article_service.list_posts(pagination).await?;
    Ok(ApiResponse::ok(ArticleList {
        articles: page.items,
        total: page.total,
        current_page: page.current_page,
    }))
}

/// One post. Counts as a view.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ArticleEnvelope<PostDetail>>> {
    let article = state.article_service.get_post(id).await?;
    Ok(ApiResponse::ok(ArticleEnvelope { article }))
}

/// Comments on a post.
async fn comments(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<CommentList>> {
    let comments = state.comment_service.list_for_post(id, viewer.id()).await?;
    Ok(ApiResponse::ok(CommentList { comments }))
}

/// Replies under a comment. `id` is the comment id.
pub(super) async fn replies(
    viewer: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ReplyList>> {
    let replies = state.comment_service.list_replies(id, viewer.id()).await?;
    Ok(ApiResponse::ok(ReplyList { replies }))
}

/// The caller's posts.
async fn my_posts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<ApiResponse<PublishedList>> {
    let page = state
        .article_service
        .list_user_posts(&user.id, pagination)
        .await?;
    Ok(ApiResponse::ok(PublishedList {
        published_articles: page.items,
        total: page.total,
        current_page: page.current_page,
    }))
}

/// The caller's drafts.
async fn my_drafts(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<ApiResponse<DraftList>> {
    let page = state
        .article_service
        .list_user_drafts(&user.id, pagination)
        .await?;
    Ok(ApiResponse::ok(DraftList {
        drafts: page.items,
        total: page.total,
        current_page: page.current_page,
    }))
}

/// One of the caller's drafts.
async fn show_draft(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<ArticleEnvelope<DraftDetail>>> {
    let article = state.article_service.get_draft(&user.id, id).await?;
    Ok(ApiResponse::ok(ArticleEnvelope { article }))
}

/// Publish, promoting the draft named by `id` when there is one.
async fn publish(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ArticleInput>,
) -> AppResult<Created> {
    let id = state.article_service.publish(&user.id, req).await?;
    Ok(Created {
        msg: "Article published",
        id,
    })
}

/// Save a draft.
async fn save(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ArticleInput>,
) -> AppResult<Created> {
    let id = state.article_service.save_draft(&user.id, req).await?;
    Ok(Created {
        msg: "Draft saved",
        id,
    })
}

async fn delete_post(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Message>> {
    state.article_service.delete_post(&user.id, id).await?;
    Ok(message("Post deleted"))
}

async fn delete_draft(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Message>> {
    state.article_service.delete_draft(&user.id, id).await?;
    Ok(message("Draft deleted"))
}

/// Comment on a post.
async fn create_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentView>> {
    let comment = state.comment_service.create_comment(&user, req).await?;
    Ok(ApiResponse::created(comment))
}

/// Reply to a comment or to another reply.
async fn create_reply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReplyInput>,
) -> AppResult<ApiResponse<ReplyView>> {
    let reply = state.comment_service.create_reply(&user, req).await?;
    Ok(ApiResponse::created(reply))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/publish", get(my_posts).post(publish))
        .route("/save", post(save))
        .route("/drafts", get(my_drafts))
        .route("/draft/{id}", get(show_draft).delete(delete_draft))
        .route("/post/{id}", delete(delete_post))
        .route("/comments", post(create_comment))
        .route("/replies", post(create_reply))
        .route("/{id}", get(show))
        .route("/{id}/comments", get(comments))
        .route("/{id}/replies", get(replies))
}
