//! Like repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{Like, like};
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Like repository for database operations.
///
/// A like is keyed by `(user_id, target_type, target_id)`, where the
/// target type is [`like::TARGET_COMMENT`] or [`like::TARGET_REPLY`].
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Whether the user has liked the target.
    pub async fn exists_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        target_type: &str,
        target_id: i64,
    ) -> AppResult<bool> {
        let count = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.eq(target_id))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Whether the user has liked the target.
    pub async fn exists(&self, user_id: &str, target_type: &str, target_id: i64) -> AppResult<bool> {
        self.exists_with(self.db.as_ref(), user_id, target_type, target_id)
            .await
    }

    /// Insert a like.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: like::ActiveModel,
    ) -> AppResult<like::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a user's like. Returns whether a row was deleted.
    pub async fn delete_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
        target_type: &str,
        target_id: i64,
    ) -> AppResult<bool> {
        let result = Like::delete_many()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.eq(target_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected > 0)
    }

    /// Remove every like on the given targets.
    pub async fn delete_for_targets_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        target_type: &str,
        target_ids: &[i64],
    ) -> AppResult<u64> {
        if target_ids.is_empty() {
            return Ok(0);
        }

        let result = Like::delete_many()
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.is_in(target_ids.iter().copied()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Which of the given targets the user has liked.
    pub async fn liked_target_ids(
        &self,
        user_id: &str,
        target_type: &str,
        target_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        if target_ids.is_empty() {
            return Ok(HashSet::new());
        }

        Ok(Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::TargetType.eq(target_type))
            .filter(like::Column::TargetId.is_in(target_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|l| l.target_id)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_like(id: i64, target_id: i64) -> like::Model {
        like::Model {
            id,
            user_id: "user1".to_string(),
            target_type: like::TARGET_COMMENT.to_string(),
            target_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_exists() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.exists("user1", like::TARGET_COMMENT, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db.clone());
        let deleted = repo
            .delete_with(db.as_ref(), "user1", like::TARGET_REPLY, 3)
            .await
            .unwrap();

        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_liked_target_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_like(1, 10), create_test_like(2, 12)]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let liked = repo
            .liked_target_ids("user1", like::TARGET_COMMENT, &[10, 11, 12])
            .await
            .unwrap();

        assert!(liked.contains(&10));
        assert!(!liked.contains(&11));
        assert!(liked.contains(&12));
    }
}
