//! Post repository.

use std::sync::Arc;

use crate::entities::{Post, post};
use blog_common::{AppError, AppResult, Pagination};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID on the given connection.
    pub async fn find_by_id_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: i64,
    ) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<post::Model>> {
        self.find_by_id_with(self.db.as_ref(), id).await
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post: {id}")))
    }

    /// List posts, newest first.
    pub async fn list(&self, pagination: Pagination) -> AppResult<Vec<post::Model>> {
        Post::find()
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all posts.
    pub async fn count(&self) -> AppResult<u64> {
        Post::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's posts, newest first.
    pub async fn list_by_user(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> AppResult<Vec<post::Model>> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(pagination.offset())
            .limit(pagination.limit())
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's posts.
    pub async fn count_by_user(&self, user_id: &str) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts filed under any of the given categories, newest first.
    pub async fn list_by_categories(&self, category_ids: &[i64]) -> AppResult<Vec<post::Model>> {
        if category_ids.is_empty() {
            return Ok(vec![]);
        }

        Post::find()
            .filter(post::Column::CategoryId.is_in(category_ids.iter().copied()))
            .order_by_desc(post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a post.
    pub async fn create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post. Comments, replies and tag links cascade.
    pub async fn delete_with<C: ConnectionTrait>(&self, conn: &C, id: i64) -> AppResult<()> {
        Post::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment the view counter atomically.
    pub async fn increment_views(&self, id: i64) -> AppResult<()> {
        Post::update_many()
            .col_expr(
                post::Column::ViewsCnt,
                Expr::col(post::Column::ViewsCnt).add(1),
            )
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_post(id: i64, user_id: &str) -> post::Model {
        post::Model {
            id,
            title: format!("Post {id}"),
            excerpt: "excerpt".to_string(),
            content: "content".to_string(),
            cover: String::new(),
            views_cnt: 0,
            like_cnt: 0,
            user_id: user_id.to_string(),
            category_id: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post(1, "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_id(1).await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().title, "Post 1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id(42).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_user() {
        let posts = vec![create_test_post(2, "user1"), create_test_post(1, "user1")];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([posts])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .list_by_user("user1", Pagination::new(1, 10))
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
    }

    #[tokio::test]
    async fn test_list_huge_page_offset_fits_bigint() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db.clone());
        let result = repo
            .list(Pagination::new(100_000_000_000_000_000, 100))
            .await
            .unwrap();
        assert!(result.is_empty());
        drop(repo);

        let log = Arc::try_unwrap(db).unwrap().into_transaction_log();
        let sql = log[0].statements()[0].to_string();
        assert!(sql.contains(&format!("OFFSET {}", i64::MAX)), "{sql}");
    }

    #[tokio::test]
    async fn test_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(5))
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_create_with() {
        let created = create_test_post(9, "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .into_connection(),
        );

        let repo = PostRepository::new(db.clone());
        let model = post::ActiveModel {
            title: Set("Post 9".to_string()),
            user_id: Set("user1".to_string()),
            ..Default::default()
        };
        let post = repo.create_with(db.as_ref(), model).await.unwrap();

        assert_eq!(post.id, 9);
    }

    #[tokio::test]
    async fn test_list_by_categories_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db);
        assert!(repo.list_by_categories(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_increment_views() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        repo.increment_views(1).await.unwrap();
    }
}
