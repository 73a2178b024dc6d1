//! Comment and reply service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use blog_common::{AppError, AppResult};
use blog_db::{
    entities::{comment, like, reply, user},
    repositories::{
        CommentRepository, LikeRepository, PostRepository, ReplyRepository, UserRepository,
    },
    transaction,
};
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::article::AuthorProfile;

/// Input for commenting on a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    #[validate(range(min = 1))]
    pub article_id: i64,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Input for replying to a comment, optionally to another reply under it.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReplyInput {
    #[validate(range(min = 1))]
    pub comment_id: i64,

    #[serde(default)]
    pub parent_id: Option<i64>,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModifyCommentInput {
    #[validate(range(min = 1))]
    pub comment_id: i64,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Input for editing a reply.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModifyReplyInput {
    #[validate(range(min = 1))]
    pub reply_id: i64,

    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub article_id: i64,
    pub content: String,
    pub likes: i64,
    pub replies: i64,
    pub liked: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub author: AuthorProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: i64,
    pub comment_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
    pub likes: i64,
    pub liked: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub author: AuthorProfile,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    reply_repo: ReplyRepository,
    like_repo: LikeRepository,
    user_repo: UserRepository,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        reply_repo: ReplyRepository,
        like_repo: LikeRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            post_repo,
            comment_repo,
            reply_repo,
            like_repo,
            user_repo,
        }
    }

    /// Comments on a post, oldest first.
    pub async fn list_for_post(
        &self,
        post_id: i64,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<CommentView>> {
        if self.post_repo.find_by_id(post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post: {post_id}")));
        }

        let comments = self.comment_repo.list_by_post(post_id).await?;
        if comments.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
        let user_ids: Vec<String> = comments.iter().map(|c| c.user_id.clone()).collect();
        let authors = self.authors(&user_ids).await?;
        let reply_counts = self.reply_repo.counts_by_comments(&ids).await?;
        let liked = self.liked(viewer_id, like::TARGET_COMMENT, &ids).await?;

        Ok(comments
            .into_iter()
            .map(|c| {
                let author = authors.get(&c.user_id).map(AuthorProfile::from);
                let replies = reply_counts.get(&c.id).copied().unwrap_or(0);
                let is_liked = liked.contains(&c.id);
                comment_view(c, author, replies, is_liked)
            })
            .collect())
    }

    /// Replies under a comment, oldest first.
    pub async fn list_replies(
        &self,
        comment_id: i64,
        viewer_id: Option<&str>,
    ) -> AppResult<Vec<ReplyView>> {
        if self.comment_repo.find_by_id(comment_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Comment: {comment_id}")));
        }

        let replies = self.reply_repo.list_by_comment(comment_id).await?;
        if replies.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i64> = replies.iter().map(|r| r.id).collect();
        let user_ids: Vec<String> = replies.iter().map(|r| r.user_id.clone()).collect();
        let authors = self.authors(&user_ids).await?;
        let liked = self.liked(viewer_id, like::TARGET_REPLY, &ids).await?;

        Ok(replies
            .into_iter()
            .map(|r| {
                let author = authors.get(&r.user_id).map(AuthorProfile::from);
                let is_liked = liked.contains(&r.id);
                reply_view(r, author, is_liked)
            })
            .collect())
    }

    /// Comment on a post.
    pub async fn create_comment(
        &self,
        user: &user::Model,
        input: CreateCommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;

        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            if self
                .post_repo
                .find_by_id_with(&txn, input.article_id)
                .await?
                .is_none()
            {
                return Err(AppError::NotFound(format!("Post: {}", input.article_id)));
            }

            let model = comment::ActiveModel {
                content: Set(input.content),
                like_cnt: Set(0),
                post_id: Set(input.article_id),
                user_id: Set(user.id.clone()),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                ..Default::default()
            };
            self.comment_repo.create_with(&txn, model).await
        }
        .await;
        let comment = transaction::finish(txn, result).await?;

        info!(user_id = %user.id, post_id = comment.post_id, comment_id = comment.id, "Comment created");
        Ok(comment_view(comment, Some(AuthorProfile::from(user)), 0, false))
    }

    /// Reply to a comment.
    pub async fn create_reply(
        &self,
        user: &user::Model,
        input: CreateReplyInput,
    ) -> AppResult<ReplyView> {
        input.validate()?;

        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            let comment = self
                .comment_repo
                .find_by_id_with(&txn, input.comment_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Comment: {}", input.comment_id)))?;

            let parent_id = input.parent_id.filter(|id| *id > 0);
            if let Some(parent_id) = parent_id {
                let parent = self.reply_repo.find_by_id_with(&txn, parent_id).await?;
                if parent.is_none_or(|p| p.comment_id != comment.id) {
                    return Err(AppError::BadRequest(
                        "Parent reply does not belong to this comment".to_string(),
                    ));
                }
            }

            let model = reply::ActiveModel {
                content: Set(input.content),
                like_cnt: Set(0),
                post_id: Set(comment.post_id),
                comment_id: Set(comment.id),
                parent_id: Set(parent_id),
                user_id: Set(user.id.clone()),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
                ..Default::default()
            };
            self.reply_repo.create_with(&txn, model).await
        }
        .await;
        let reply = transaction::finish(txn, result).await?;

        info!(user_id = %user.id, comment_id = reply.comment_id, reply_id = reply.id, "Reply created");
        Ok(reply_view(reply, Some(AuthorProfile::from(user)), false))
    }

    /// Edit one of the caller's comments.
    pub async fn modify_comment(
        &self,
        user: &user::Model,
        input: ModifyCommentInput,
    ) -> AppResult<CommentView> {
        input.validate()?;

        let comment = self
            .comment_repo
            .find_by_id(input.comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment: {}", input.comment_id)))?;
        ensure_author(&comment.user_id, &user.id)?;
        if comment.content == input.content {
            return Err(AppError::BadRequest("No changes".to_string()));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(input.content);
        active.updated_at = Set(Some(Utc::now().into()));
        let comment = self.comment_repo.update(active).await?;

        let replies = self
            .reply_repo
            .counts_by_comments(&[comment.id])
            .await?
            .get(&comment.id)
            .copied()
            .unwrap_or(0);
        let liked = self
            .like_repo
            .exists(&user.id, like::TARGET_COMMENT, comment.id)
            .await?;

        Ok(comment_view(comment, Some(AuthorProfile::from(user)), replies, liked))
    }

    /// Edit one of the caller's replies.
    pub async fn modify_reply(
        &self,
        user: &user::Model,
        input: ModifyReplyInput,
    ) -> AppResult<ReplyView> {
        input.validate()?;

        let reply = self
            .reply_repo
            .find_by_id(input.reply_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply: {}", input.reply_id)))?;
        ensure_author(&reply.user_id, &user.id)?;
        if reply.content == input.content {
            return Err(AppError::BadRequest("No changes".to_string()));
        }

        let mut active: reply::ActiveModel = reply.into();
        active.content = Set(input.content);
        active.updated_at = Set(Some(Utc::now().into()));
        let reply = self.reply_repo.update(active).await?;

        let liked = self
            .like_repo
            .exists(&user.id, like::TARGET_REPLY, reply.id)
            .await?;

        Ok(reply_view(reply, Some(AuthorProfile::from(user)), liked))
    }

    /// Delete one of the caller's comments with its replies and their likes.
    pub async fn delete_comment(&self, user_id: &str, comment_id: i64) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            let comment = self
                .comment_repo
                .find_by_id_with(&txn, comment_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Comment: {comment_id}")))?;
            ensure_author(&comment.user_id, user_id)?;

            let reply_ids = self.reply_repo.ids_by_comment_with(&txn, comment_id).await?;
            self.like_repo
                .delete_for_targets_with(&txn, like::TARGET_REPLY, &reply_ids)
                .await?;
            self.like_repo
                .delete_for_targets_with(&txn, like::TARGET_COMMENT, &[comment_id])
                .await?;
            self.comment_repo.delete_with(&txn, comment_id).await
        }
        .await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, comment_id, "Comment deleted");
        Ok(())
    }

    /// Delete one of the caller's replies with everything nested under it.
    pub async fn delete_reply(&self, user_id: &str, reply_id: i64) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            let reply = self
                .reply_repo
                .find_by_id_with(&txn, reply_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Reply: {reply_id}")))?;
            ensure_author(&reply.user_id, user_id)?;

            let subtree = self.reply_subtree(&txn, reply_id).await?;
            self.like_repo
                .delete_for_targets_with(&txn, like::TARGET_REPLY, &subtree)
                .await?;
            self.reply_repo.delete_with(&txn, reply_id).await
        }
        .await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, reply_id, "Reply deleted");
        Ok(())
    }

    /// `root` and the ids of every reply nested below it.
    async fn reply_subtree<C: ConnectionTrait>(&self, conn: &C, root: i64) -> AppResult<Vec<i64>> {
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            let children = self.reply_repo.child_ids_with(conn, ids[cursor]).await?;
            ids.extend(children);
            cursor += 1;
        }
        Ok(ids)
    }

    async fn authors(&self, user_ids: &[String]) -> AppResult<HashMap<String, user::Model>> {
        let mut unique: Vec<String> = user_ids.to_vec();
        unique.sort();
        unique.dedup();

        Ok(self
            .user_repo
            .find_by_ids(&unique)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }

    async fn liked(
        &self,
        viewer_id: Option<&str>,
        target_type: &str,
        ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        match viewer_id {
            Some(viewer) => self.like_repo.liked_target_ids(viewer, target_type, ids).await,
            None => Ok(HashSet::new()),
        }
    }
}

fn ensure_author(owner_id: &str, user_id: &str) -> AppResult<()> {
    if owner_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only change your own comments".to_string(),
        ))
    }
}

fn unknown_author(user_id: &str) -> AuthorProfile {
    AuthorProfile {
        id: user_id.to_string(),
        username: String::new(),
        avatar: String::new(),
    }
}

fn comment_view(
    c: comment::Model,
    author: Option<AuthorProfile>,
    replies: i64,
    liked: bool,
) -> CommentView {
    CommentView {
        author: author.unwrap_or_else(|| unknown_author(&c.user_id)),
        id: c.id,
        article_id: c.post_id,
        content: c.content,
        likes: c.like_cnt,
        replies,
        liked,
        created_at: c.created_at,
        updated_at: c.updated_at,
    }
}

fn reply_view(r: reply::Model, author: Option<AuthorProfile>, liked: bool) -> ReplyView {
    ReplyView {
        author: author.unwrap_or_else(|| unknown_author(&r.user_id)),
        id: r.id,
        comment_id: r.comment_id,
        parent_id: r.parent_id,
        content: r.content,
        likes: r.like_cnt,
        liked,
        created_at: r.created_at,
        updated_at: r.updated_at,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blog_db::entities::post;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            db.clone(),
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            ReplyRepository::new(db.clone()),
            LikeRepository::new(db.clone()),
            UserRepository::new(db),
        )
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("{id}_name"),
            email: format!("{id}@example.com"),
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

    fn test_post(id: i64) -> post::Model {
        post::Model {
            id,
            title: "T".to_string(),
            excerpt: "E".to_string(),
            content: "C".to_string(),
            cover: String::new(),
            views_cnt: 0,
            like_cnt: 0,
            user_id: "author".to_string(),
            category_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_comment(id: i64, user_id: &str) -> comment::Model {
        comment::Model {
            id,
            content: "Nice post".to_string(),
            like_cnt: 0,
            post_id: 1,
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_reply(id: i64, comment_id: i64, parent_id: Option<i64>) -> reply::Model {
        reply::Model {
            id,
            content: "Agreed".to_string(),
            like_cnt: 0,
            post_id: 1,
            comment_id,
            parent_id,
            user_id: "user1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<post::Model>::new()])
            .into_connection();

        let input = CreateCommentInput {
            article_id: 1,
            content: "hi".to_string(),
        };
        let result = service(db).create_comment(&test_user("user1"), input).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_requires_article_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let input = CreateCommentInput {
            article_id: 0,
            content: "hi".to_string(),
        };
        let result = service(db).create_comment(&test_user("user1"), input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(1)]])
            .append_query_results([[test_comment(5, "user1")]])
            .into_connection();

        let input = CreateCommentInput {
            article_id: 1,
            content: "Nice post".to_string(),
        };
        let view = service(db)
            .create_comment(&test_user("user1"), input)
            .await
            .unwrap();

        assert_eq!(view.id, 5);
        assert_eq!(view.author.username, "user1_name");
        assert_eq!(view.replies, 0);
        assert!(!view.liked);
    }

    #[tokio::test]
    async fn test_reply_parent_must_share_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(3, "user1")]])
            .append_query_results([[test_reply(7, 4, None)]])
            .into_connection();

        let input = CreateReplyInput {
            comment_id: 3,
            parent_id: Some(7),
            content: "hi".to_string(),
        };
        let result = service(db).create_reply(&test_user("user1"), input).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_nested_reply() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(3, "user1")]])
            .append_query_results([[test_reply(7, 3, None)]])
            .append_query_results([[test_reply(8, 3, Some(7))]])
            .into_connection();

        let input = CreateReplyInput {
            comment_id: 3,
            parent_id: Some(7),
            content: "Agreed".to_string(),
        };
        let view = service(db)
            .create_reply(&test_user("user1"), input)
            .await
            .unwrap();

        assert_eq!(view.id, 8);
        assert_eq!(view.parent_id, Some(7));
    }

    #[tokio::test]
    async fn test_modify_comment_without_changes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(5, "user1")]])
            .into_connection();

        let input = ModifyCommentInput {
            comment_id: 5,
            content: "Nice post".to_string(),
        };
        let result = service(db).modify_comment(&test_user("user1"), input).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_modify_foreign_comment_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(5, "someone_else")]])
            .into_connection();

        let input = ModifyCommentInput {
            comment_id: 5,
            content: "edited".to_string(),
        };
        let result = service(db).modify_comment(&test_user("user1"), input).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_comment_clears_likes() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(5, "user1")]])
            .append_query_results([[test_reply(8, 5, None)]])
            // likes on replies, likes on the comment, the comment itself
            .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
            .into_connection();

        service(db).delete_comment("user1", 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_reply_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reply::Model>::new()])
            .into_connection();

        let result = service(db).delete_reply("user1", 8).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reply_subtree_walks_nested_replies() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_reply(9, 3, Some(8)), test_reply(10, 3, Some(8))]])
            .append_query_results([[test_reply(11, 3, Some(9))]])
            .append_query_results([Vec::<reply::Model>::new()])
            .append_query_results([Vec::<reply::Model>::new()])
            .into_connection();

        let svc = service(db);
        let ids = svc.reply_subtree(svc.db.as_ref(), 8).await.unwrap();
        assert_eq!(ids, vec![8, 9, 10, 11]);
    }

    #[tokio::test]
    async fn test_list_for_post_marks_liked() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_post(1)]])
            .append_query_results([vec![test_comment(1, "user1"), test_comment(2, "user1")]])
            .append_query_results([[test_user("user1")]])
            .append_query_results([[maplit::btreemap! {
                "comment_id" => sea_orm::Value::BigInt(Some(1)),
                "count" => sea_orm::Value::BigInt(Some(2)),
            }]])
            .append_query_results([[like::Model {
                id: 1,
                user_id: "viewer".to_string(),
                target_type: like::TARGET_COMMENT.to_string(),
                target_id: 2,
                created_at: Utc::now().into(),
            }]])
            .into_connection();

        let views = service(db).list_for_post(1, Some("viewer")).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].replies, 2);
        assert!(!views[0].liked);
        assert_eq!(views[1].replies, 0);
        assert!(views[1].liked);
        assert_eq!(views[1].author.username, "user1_name");
    }
}
