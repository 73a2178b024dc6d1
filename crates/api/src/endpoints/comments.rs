//! Comment and reply endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use blog_common::AppResult;
use blog_core::{CommentView, LikeTarget, ModifyCommentInput, ModifyReplyInput, ReplyView};
use serde::Serialize;

use super::articles::replies;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

#[derive(Serialize)]
pub struct LikeStatus {
    pub liked: bool,
}

async fn modify_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ModifyCommentInput>,
) -> AppResult<ApiResponse<CommentView>> {
    let comment = state.comment_service.modify_comment(&user, req).await?;
    Ok(ApiResponse::ok(comment))
}

async fn modify_reply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ModifyReplyInput>,
) -> AppResult<ApiResponse<ReplyView>> {
    let reply = state.comment_service.modify_reply(&user, req).await?;
    Ok(ApiResponse::ok(reply))
}

async fn delete_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Message>> {
    state.comment_service.delete_comment(&user.id, id).await?;
    Ok(message("Comment deleted"))
}

async fn delete_reply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Message>> {
    state.comment_service.delete_reply(&user.id, id).await?;
    Ok(message("Reply deleted"))
}

async fn like_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<LikeStatus>> {
    state
        .like_service
        .like(&user.id, LikeTarget::Comment(id))
        .await?;
    Ok(ApiResponse::ok(LikeStatus { liked: true }))
}

async fn unlike_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<LikeStatus>> {
    state
        .like_service
        .unlike(&user.id, LikeTarget::Comment(id))
        .await?;
    Ok(ApiResponse::ok(LikeStatus { liked: false }))
}

async fn like_reply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<LikeStatus>> {
    state.like_service.like(&user.id, LikeTarget::Reply(id)).await?;
    Ok(ApiResponse::ok(LikeStatus { liked: true }))
}

async fn unlike_reply(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<LikeStatus>> {
    state
        .like_service
        .unlike(&user.id, LikeTarget::Reply(id))
        .await?;
    Ok(ApiResponse::ok(LikeStatus { liked: false }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comments/modify", post(modify_comment))
        .route("/comments/{id}", delete(delete_comment))
        .route("/comments/{id}/replies", get(replies))
        .route("/comments/{id}/like", post(like_comment).delete(unlike_comment))
        .route("/replies/modify", post(modify_reply))
        .route("/replies/{id}", delete(delete_reply))
        .route("/replies/{id}/like", post(like_reply).delete(unlike_reply))
}
