//! Comment repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{Comment, comment};
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

#[derive(FromQueryResult)]
struct PostCommentCount {
    post_id: i64,
    count: i64,
}

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID on the given connection.
    pub async fn find_by_id_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<comment::Model>> {
        self.find_by_id_with(self.db.as_ref(), id).await
    }

    /// Comments on a post, oldest first.
    pub async fn list_by_post(&self, post_id: i64) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of comments on a post.
    pub async fn count_by_post(&self, post_id: i64) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comment counts for several posts. Posts without comments are absent.
    pub async fn counts_by_posts(&self, post_ids: &[i64]) -> AppResult<HashMap<i64, i64>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = Comment::find()
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .group_by(comment::Column::PostId)
            .into_model::<PostCommentCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| (r.post_id, r.count)).collect())
    }

    /// IDs of every comment on a post.
    pub async fn ids_by_post_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: i64,
    ) -> AppResult<Vec<i64>> {
        Ok(Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|c| c.id)
            .collect())
    }

    /// Insert a comment.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a comment.
    pub async fn update(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a comment. Its replies cascade.
    pub async fn delete_with<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<()> {
        Comment::delete_by_id(id)
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
        Comment::update_many()
            .col_expr(
                comment::Column::LikeCnt,
                Expr::col(comment::Column::LikeCnt).add(1),
            )
            .filter(comment::Column::Id.eq(id))
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
        Comment::update_many()
            .col_expr(
                comment::Column::LikeCnt,
                Expr::cust("GREATEST(like_cnt - 1, 0)"),
            )
            .filter(comment::Column::Id.eq(id))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_comment(id: i64, post_id: i64) -> comment::Model {
        comment::Model {
            id,
            content: "nice".to_string(),
            like_cnt: 0,
            post_id,
            user_id: "user1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_by_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_comment(1, 5), create_test_comment(2, 5)]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.list_by_post(5).await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, 1);
    }

    #[tokio::test]
    async fn test_counts_by_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    maplit::btreemap! {
                        "post_id" => sea_orm::Value::BigInt(Some(1)),
                        "count" => sea_orm::Value::BigInt(Some(3)),
                    },
                    maplit::btreemap! {
                        "post_id" => sea_orm::Value::BigInt(Some(2)),
                        "count" => sea_orm::Value::BigInt(Some(1)),
                    },
                ]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let counts = repo.counts_by_posts(&[1, 2, 3]).await.unwrap();

        assert_eq!(counts.get(&1), Some(&3));
        assert_eq!(counts.get(&2), Some(&1));
        assert_eq!(counts.get(&3), None);
    }

    #[tokio::test]
    async fn test_like_counters() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = CommentRepository::new(db.clone());
        repo.increment_like_count_with(db.as_ref(), 1).await.unwrap();
        repo.decrement_like_count_with(db.as_ref(), 1).await.unwrap();
    }
}
