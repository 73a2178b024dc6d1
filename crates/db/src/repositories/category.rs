//! Category repository.

use std::sync::Arc;

use crate::entities::{Category, category};
use blog_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's category by its normalized name.
    pub async fn find_by_name_and_user_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
        user_id: &str,
    ) -> AppResult<Option<category::Model>> {
        Category::find()
            .filter(category::Column::Name.eq(name))
            .filter(category::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a category.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: category::ActiveModel,
    ) -> AppResult<category::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's categories, by name.
    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<category::Model>> {
        Category::find()
            .filter(category::Column::UserId.eq(user_id))
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
