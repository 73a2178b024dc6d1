//! Reply repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Reply, reply};
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

#[derive(FromQueryResult)]
struct CommentReplyCount {
    comment_id: i64,
    count: i64,
}

/// Reply repository for database operations.
#[derive(Clone)]
pub struct ReplyRepository {
    db: Arc<DatabaseConnection>,
}

impl ReplyRepository {
    /// Create a new reply repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a reply by ID on the given connection.
    pub async fn find_by_id_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<Option<reply::Model>> {
        Reply::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reply by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<reply::Model>> {
        self.find_by_id_with(self.db.as_ref(), id).await
    }

    /// Replies under a comment, oldest first.
    pub async fn list_by_comment(&self, comment_id: i64) -> AppResult<Vec<reply::Model>> {
        Reply::find()
            .filter(reply::Column::CommentId.eq(comment_id))
            .order_by_asc(reply::Column::CreatedAt)
            .order_by_asc(reply::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reply counts for several comments. Comments without replies are absent.
    pub async fn counts_by_comments(&self, comment_ids: &[i64]) -> AppResult<HashMap<i64, i64>> {
        if comment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Reply::find()
            .filter(reply::Column::CommentId.is_in(comment_ids.iter().copied()))
            .select_only()
            .column(reply::Column::CommentId)
            .column_as(reply::Column::Id.count(), "count")
            .group_by(reply::Column::CommentId)
            .into_model::<CommentReplyCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| (r.comment_id, r.count)).collect())
    }

    /// IDs of every reply under a comment.
    pub async fn ids_by_comment_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        comment_id: i64,
    ) -> AppResult<Vec<i64>> {
        Ok(Reply::find()
            .filter(reply::Column::CommentId.eq(comment_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// IDs of every reply on a post.
    pub async fn ids_by_post_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: i64,
    ) -> AppResult<Vec<i64>> {
        Ok(Reply::find()
            .filter(reply::Column::PostId.eq(post_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// IDs of the direct children of a reply.
    pub async fn child_ids_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        parent_id: i64,
    ) -> AppResult<Vec<i64>> {
        Ok(Reply::find()
            .filter(reply::Column::ParentId.eq(parent_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|r| r.id)
            .collect())
    }

    /// Insert a reply.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: reply::ActiveModel,
    ) -> AppResult<reply::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a reply.
    pub async fn update(&self, model: reply::ActiveModel) -> AppResult<reply::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a reply. Nested replies cascade.
    pub async fn delete_with<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<()> {
        Reply::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the like counter atomically.
    pub async fn increment_like_count_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<()> {
        Reply::update_many()
            .col_expr(
                reply::Column::LikeCnt,
                Expr::col(reply::Column::LikeCnt).add(1),
            )
            .filter(reply::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement the like counter atomically, never below zero.
    pub async fn decrement_like_count_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<()> {
        Reply::update_many()
            .col_expr(reply::Column::LikeCnt, Expr::cust("GREATEST(like_cnt - 1, 0)"))
            .filter(reply::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_reply(id: i64, comment_id: i64, parent_id: Option<i64>) -> reply::Model {
        reply::Model {
            id,
            content: "agreed".to_string(),
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
    async fn test_list_by_comment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_reply(1, 7, None),
                    create_test_reply(2, 7, Some(1)),
                ]])
                .into_connection(),
        );

        let repo = ReplyRepository::new(db);
        let replies = repo.list_by_comment(7).await.unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1].parent_id, Some(1));
    }

    #[tokio::test]
    async fn test_ids_by_comment() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_reply(4, 7, None),
                    create_test_reply(5, 7, Some(4)),
                ]])
                .into_connection(),
        );

        let repo = ReplyRepository::new(db.clone());
        let ids = repo.ids_by_comment_with(db.as_ref(), 7).await.unwrap();

        assert_eq!(ids, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_counts_by_comments_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = ReplyRepository::new(db);
        assert!(repo.counts_by_comments(&[]).await.unwrap().is_empty());
    }
}
