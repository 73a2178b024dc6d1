//! Likes on comments and replies.

use std::sync::Arc;

use blog_common::{AppError, AppResult};
use blog_db::{
    entities::like,
    repositories::{CommentRepository, LikeRepository, ReplyRepository},
    transaction,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use tracing::info;

/// Something a user can like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Comment(i64),
    Reply(i64),
}

impl LikeTarget {
    /// Value stored in `like.target_type`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Comment(_) => like::TARGET_COMMENT,
            Self::Reply(_) => like::TARGET_REPLY,
        }
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Comment(id) | Self::Reply(id) => *id,
        }
    }
}

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    db: Arc<DatabaseConnection>,
    comment_repo: CommentRepository,
    reply_repo: ReplyRepository,
    like_repo: LikeRepository,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        comment_repo: CommentRepository,
        reply_repo: ReplyRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            db,
            comment_repo,
            reply_repo,
            like_repo,
        }
    }

    /// Like a comment or reply. Liking twice is a conflict.
    pub async fn like(&self, user_id: &str, target: LikeTarget) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            self.ensure_target_exists(&txn, target).await?;

            if self
                .like_repo
                .exists_with(&txn, user_id, target.kind(), target.id())
                .await?
            {
                return Err(AppError::Conflict("Already liked".to_string()));
            }

            let model = like::ActiveModel {
                user_id: Set(user_id.to_string()),
                target_type: Set(target.kind().to_string()),
                target_id: Set(target.id()),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };
            self.like_repo.create_with(&txn, model).await?;

            match target {
                LikeTarget::Comment(id) => {
                    self.comment_repo.increment_like_count_with(&txn, id).await
                }
                LikeTarget::Reply(id) => self.reply_repo.increment_like_count_with(&txn, id).await,
            }
        }
        .await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, target = target.kind(), target_id = target.id(), "Liked");
        Ok(())
    }

    /// Withdraw a like.
    pub async fn unlike(&self, user_id: &str, target: LikeTarget) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            if !self
                .like_repo
                .delete_with(&txn, user_id, target.kind(), target.id())
                .await?
            {
                return Err(AppError::NotFound("Like".to_string()));
            }

            match target {
                LikeTarget::Comment(id) => {
                    self.comment_repo.decrement_like_count_with(&txn, id).await
                }
                LikeTarget::Reply(id) => self.reply_repo.decrement_like_count_with(&txn, id).await,
            }
        }
        .await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, target = target.kind(), target_id = target.id(), "Unliked");
        Ok(())
    }

    /// Whether the user currently likes the target.
    pub async fn is_liked(&self, user_id: &str, target: LikeTarget) -> AppResult<bool> {
        self.like_repo
            .exists(user_id, target.kind(), target.id())
            .await
    }

    async fn ensure_target_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: LikeTarget,
    ) -> AppResult<()> {
        let found = match target {
            LikeTarget::Comment(id) => self.comment_repo.find_by_id_with(conn, id).await?.is_some(),
            LikeTarget::Reply(id) => self.reply_repo.find_by_id_with(conn, id).await?.is_some(),
        };

        if found {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "{}: {}",
                target.kind(),
                target.id()
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blog_db::entities::comment;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn service(db: DatabaseConnection) -> LikeService {
        let db = Arc::new(db);
        LikeService::new(
            db.clone(),
            CommentRepository::new(db.clone()),
            ReplyRepository::new(db.clone()),
            LikeRepository::new(db),
        )
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn count(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! { "num_items" => sea_orm::Value::BigInt(Some(n)) }
    }

    fn test_comment(id: i64) -> comment::Model {
        comment::Model {
            id,
            content: "c".to_string(),
            like_cnt: 0,
            post_id: 1,
            user_id: "author".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_like(target_id: i64) -> like::Model {
        like::Model {
            id: 1,
            user_id: "user1".to_string(),
            target_type: like::TARGET_COMMENT.to_string(),
            target_id,
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_target_kind() {
        assert_eq!(LikeTarget::Comment(3).kind(), "comment");
        assert_eq!(LikeTarget::Reply(4).kind(), "reply");
        assert_eq!(LikeTarget::Reply(4).id(), 4);
    }

    #[tokio::test]
    async fn test_like_comment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(3)]])
            .append_query_results([[count(0)]])
            .append_query_results([[test_like(3)]])
            .append_exec_results([exec(1)])
            .into_connection();

        service(db)
            .like("user1", LikeTarget::Comment(3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_like_twice_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_comment(3)]])
            .append_query_results([[count(1)]])
            .into_connection();

        let result = service(db).like("user1", LikeTarget::Comment(3)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_like_missing_target() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<comment::Model>::new()])
            .into_connection();

        let result = service(db).like("user1", LikeTarget::Comment(3)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(0)])
            .into_connection();

        let result = service(db).unlike("user1", LikeTarget::Reply(8)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unlike_decrements() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([exec(1), exec(1)])
            .into_connection();

        service(db)
            .unlike("user1", LikeTarget::Reply(8))
            .await
            .unwrap();
    }
}
