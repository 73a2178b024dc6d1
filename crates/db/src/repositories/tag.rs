//! Tag repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{DraftTag, PostTag, Tag, draft_tag, post_tag, tag};
use blog_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// The article a tag association belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTarget {
    /// Links in `post_tag`.
    Post(i64),
    /// Links in `draft_tag`.
    Draft(i64),
}

/// Tag repository for database operations.
#[derive(Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Create a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a tag by its exact (already normalized) name.
    pub async fn find_by_name_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<Option<tag::Model>> {
        Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a tag by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<tag::Model>> {
        self.find_by_name_with(self.db.as_ref(), &name.to_lowercase())
            .await
    }

    /// Get or create a tag. The name is lowercased first.
    pub async fn get_or_create_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        name: &str,
    ) -> AppResult<tag::Model> {
        let name_lower = name.to_lowercase();

        if let Some(tag) = self.find_by_name_with(conn, &name_lower).await? {
            return Ok(tag);
        }

        let model = tag::ActiveModel {
            name: Set(name_lower),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tag ids associated with an article.
    pub async fn tag_ids_for_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: TagTarget,
    ) -> AppResult<Vec<i64>> {
        let ids = match target {
            TagTarget::Post(id) => PostTag::find()
                .filter(post_tag::Column::PostId.eq(id))
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|row| row.tag_id)
                .collect(),
            TagTarget::Draft(id) => DraftTag::find()
                .filter(draft_tag::Column::DraftId.eq(id))
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|row| row.tag_id)
                .collect(),
        };
        Ok(ids)
    }

    /// Tags associated with an article, ordered by name.
    ///
    /// Issues no second query when the article has no tags.
    pub async fn tags_for_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: TagTarget,
    ) -> AppResult<Vec<tag::Model>> {
        let ids = self.tag_ids_for_with(conn, target).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Tag::find()
            .filter(tag::Column::Id.is_in(ids))
            .order_by_asc(tag::Column::Name)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Tag names associated with an article.
    pub async fn names_for(&self, target: TagTarget) -> AppResult<Vec<String>> {
        Ok(self
            .tags_for_with(self.db.as_ref(), target)
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect())
    }

    /// Tag names for several posts at once, keyed by post id.
    pub async fn names_for_posts(&self, post_ids: &[i64]) -> AppResult<HashMap<i64, Vec<String>>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = PostTag::find()
            .filter(post_tag::Column::PostId.is_in(post_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pairs: Vec<(i64, i64)> = links.into_iter().map(|l| (l.post_id, l.tag_id)).collect();
        self.group_names(pairs).await
    }

    /// Tag names for several drafts at once, keyed by draft id.
    pub async fn names_for_drafts(
        &self,
        draft_ids: &[i64],
    ) -> AppResult<HashMap<i64, Vec<String>>> {
        if draft_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links = DraftTag::find()
            .filter(draft_tag::Column::DraftId.is_in(draft_ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let pairs: Vec<(i64, i64)> = links.into_iter().map(|l| (l.draft_id, l.tag_id)).collect();
        self.group_names(pairs).await
    }

    async fn group_names(&self, pairs: Vec<(i64, i64)>) -> AppResult<HashMap<i64, Vec<String>>> {
        if pairs.is_empty() {
            return Ok(HashMap::new());
        }

        let tag_ids: Vec<i64> = pairs.iter().map(|(_, tag_id)| *tag_id).collect();
        let names: HashMap<i64, String> = Tag::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .order_by_asc(tag::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();

        let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
        for (owner_id, tag_id) in pairs {
            if let Some(name) = names.get(&tag_id) {
                grouped.entry(owner_id).or_default().push(name.clone());
            }
        }
        for list in grouped.values_mut() {
            list.sort();
        }
        Ok(grouped)
    }

    /// Associate a tag with an article.
    pub async fn attach_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: TagTarget,
        tag_id: i64,
    ) -> AppResult<()> {
        match target {
            TagTarget::Post(post_id) => {
                PostTag::insert(post_tag::ActiveModel {
                    post_id: Set(post_id),
                    tag_id: Set(tag_id),
                })
                .exec_without_returning(conn)
                .await
            }
            TagTarget::Draft(draft_id) => {
                DraftTag::insert(draft_tag::ActiveModel {
                    draft_id: Set(draft_id),
                    tag_id: Set(tag_id),
                })
                .exec_without_returning(conn)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove the association between a tag and an article.
    pub async fn detach_with<C: ConnectionTrait>(
        &self,
        conn: &C,
        target: TagTarget,
        tag_id: i64,
    ) -> AppResult<()> {
        match target {
            TagTarget::Post(post_id) => {
                PostTag::delete_many()
                    .filter(post_tag::Column::PostId.eq(post_id))
                    .filter(post_tag::Column::TagId.eq(tag_id))
                    .exec(conn)
                    .await
            }
            TagTarget::Draft(draft_id) => {
                DraftTag::delete_many()
                    .filter(draft_tag::Column::DraftId.eq(draft_id))
                    .filter(draft_tag::Column::TagId.eq(tag_id))
                    .exec(conn)
                    .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
