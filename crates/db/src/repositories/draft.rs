//! Draft repository.

use std::sync::Arc;

use crate::entities::{Draft, draft};
use blog_common::{AppError, AppResult, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Draft repository for database operations.
#[derive(Clone)]
pub struct DraftRepository {
    db: Arc<DatabaseConnection>,
}

impl DraftRepository {
    /// Create a new draft repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a draft by ID on the given connection.
    pub async fn find_by_id_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<Option<draft::Model>> {
        Draft::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a draft by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<draft::Model>> {
        self.find_by_id_with(self.db.as_ref(), id).await
    }

    /// Find a draft by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<draft::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Draft: {id}")))
    }

    /// List a user's drafts, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> AppResult<Vec<draft::Model>> {
        Draft::find()
            .filter(draft::Column::UserId.eq(user_id))
            .order_by_desc(draft::Column::CreatedAt)
            .order_by_desc(draft::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's drafts.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Draft::find()
            .filter(draft::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a draft.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: draft::ActiveModel,
    ) -> AppResult<draft::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a draft.
    pub async fn update_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: draft::ActiveModel,
    ) -> AppResult<draft::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a draft. Its tag links cascade.
    pub async fn delete_with<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<()> {
        Draft::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
