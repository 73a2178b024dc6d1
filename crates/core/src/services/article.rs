//! Article service: the draft and post workflow.

use std::collections::HashMap;
use std::sync::Arc;

use blog_common::{AppError, AppResult, Pagination};
use blog_db::{
    TagTarget,
    entities::{category, draft, like, post, tag::MAX_TAG_LEN, user},
    repositories::{
        CategoryRepository, CommentRepository, DraftRepository, LikeRepository, PostRepository,
        ReplyRepository, TagRepository, UserRepository,
    },
    transaction,
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use super::tags::{TagReconciler, normalize_tag, reconcile_tags};

/// A post or a draft.
#[derive(Debug, Clone)]
pub enum Article {
    Post(post::Model),
    Draft(draft::Model),
}

impl Article {
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Post(p) => p.id,
            Self::Draft(d) => d.id,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Post(p) => &p.user_id,
            Self::Draft(d) => &d.user_id,
        }
    }

    #[must_use]
    pub const fn category_id(&self) -> Option<i64> {
        match self {
            Self::Post(p) => p.category_id,
            Self::Draft(d) => d.category_id,
        }
    }

    /// Junction table holding this article's tags.
    #[must_use]
    pub const fn tag_target(&self) -> TagTarget {
        match self {
            Self::Post(p) => TagTarget::Post(p.id),
            Self::Draft(d) => TagTarget::Draft(d.id),
        }
    }
}

/// Body of a publish or save request.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ArticleInput {
    /// Draft to promote or update.
    #[serde(default)]
    pub id: Option<i64>,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub title: String,

    #[validate(length(max = 200))]
    #[serde(default)]
    pub excerpt: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub cover: String,

    #[validate(length(max = 50))]
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ArticleInput {
    /// Field lengths, plus 1 to 20 characters for each trimmed tag.
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;

        if let Some(tags) = &self.tags {
            for raw in tags {
                let len = raw.trim().chars().count();
                if len == 0 || len > MAX_TAG_LEN {
                    return Err(AppError::Validation(format!(
                        "tags: each tag must be 1 to {MAX_TAG_LEN} characters"
                    )));
                }
            }
        }
        Ok(())
    }

    fn draft_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }
}

/// Post author as shown on detail pages.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorProfile {
    pub id: String,
    pub username: String,
    pub avatar: String,
}

impl From<&user::Model> for AuthorProfile {
    fn from(u: &user::Model) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
            avatar: u.avatar.clone().unwrap_or_default(),
        }
    }
}

/// Post in a list.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub excerpt: String,
    pub cover: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

/// Full post.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub id: i64,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub excerpt: String,
    pub cover: String,
    pub category: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub author: AuthorProfile,
    pub content: String,
}

/// Draft in a list.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub excerpt: String,
    pub cover: String,
    pub author: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// Full draft, for the editor.
#[derive(Debug, Clone, Serialize)]
pub struct DraftDetail {
    pub id: i64,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    pub excerpt: String,
    pub cover: String,
    pub category: String,
    pub tags: Vec<String>,
    pub author: AuthorProfile,
    pub content: String,
}

/// Title and timestamps of a post.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleBasic {
    pub id: i64,
    pub title: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

/// A category with its posts.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesEntry {
    pub id: i64,
    pub name: String,
    pub articles: Vec<ArticleBasic>,
}

/// One page of a list.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u64,
}

/// Article service for business logic.
#[derive(Clone)]
pub struct ArticleService {
    db: Arc<DatabaseConnection>,
    post_repo: PostRepository,
    draft_repo: DraftRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    comment_repo: CommentRepository,
    reply_repo: ReplyRepository,
    like_repo: LikeRepository,
    user_repo: UserRepository,
    reconciler: TagReconciler,
}

impl ArticleService {
    /// Create a new article service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        post_repo: PostRepository,
        draft_repo: DraftRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        comment_repo: CommentRepository,
        reply_repo: ReplyRepository,
        like_repo: LikeRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            db,
            post_repo,
            draft_repo,
            category_repo,
            reconciler: TagReconciler::new(tag_repo.clone()),
            tag_repo,
            comment_repo,
            reply_repo,
            like_repo,
            user_repo,
        }
    }

    // ==================== Publish / Save ====================

    /// Publish an article and return the post id.
    ///
    /// With the id of one of the caller's drafts, the draft is promoted to a
    /// new post and deleted. Otherwise a new post is created.
    pub async fn publish(&self, user_id: &str, input: ArticleInput) -> AppResult<i64> {
        input.check()?;

        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = self.publish_in(&txn, user_id, &input).await;
        let post_id = transaction::finish(txn, result).await?;

        info!(user_id = %user_id, post_id, "Article published");
        Ok(post_id)
    }

    async fn publish_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        input: &ArticleInput,
    ) -> AppResult<i64> {
        let existing = match input.draft_id() {
            Some(id) => self.draft_repo.find_by_id_with(txn, id).await?,
            None => None,
        };

        let post = match existing {
            Some(draft) => {
                ensure_owner(&draft.user_id, user_id, "publish")?;
                self.promote(txn, draft).await?
            }
            None => {
                let now = Utc::now().into();
                let model = post::ActiveModel {
                    title: Set(input.title.clone()),
                    excerpt: Set(input.excerpt.clone()),
                    content: Set(input.content.clone()),
                    cover: Set(input.cover.clone()),
                    views_cnt: Set(0),
                    like_cnt: Set(0),
                    user_id: Set(user_id.to_string()),
                    category_id: Set(None),
                    created_at: Set(now),
                    updated_at: Set(None),
                    ..Default::default()
                };
                self.post_repo.create_with(txn, model).await?
            }
        };

        let article = self
            .assign_category(txn, Article::Post(post), input.category.as_deref())
            .await?;
        self.apply_tags(txn, &article, input.tags.as_deref()).await?;

        Ok(article.id())
    }

    /// Save a draft and return its id.
    ///
    /// With the id of one of the caller's drafts, the draft is overwritten
    /// in place. Otherwise a new draft is created.
    pub async fn save_draft(&self, user_id: &str, input: ArticleInput) -> AppResult<i64> {
        input.check()?;

        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = self.save_draft_in(&txn, user_id, &input).await;
        let draft_id = transaction::finish(txn, result).await?;

        info!(user_id = %user_id, draft_id, "Draft saved");
        Ok(draft_id)
    }

    async fn save_draft_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        input: &ArticleInput,
    ) -> AppResult<i64> {
        let existing = match input.draft_id() {
            Some(id) => self.draft_repo.find_by_id_with(txn, id).await?,
            None => None,
        };

        let draft = match existing {
            Some(draft) => {
                ensure_owner(&draft.user_id, user_id, "edit")?;
                let mut active: draft::ActiveModel = draft.into();
                active.title = Set(input.title.clone());
                active.excerpt = Set(input.excerpt.clone());
                active.content = Set(input.content.clone());
                active.cover = Set(input.cover.clone());
                active.updated_at = Set(Some(Utc::now().into()));
                self.draft_repo.update_with(txn, active).await?
            }
            None => {
                let model = draft::ActiveModel {
                    title: Set(input.title.clone()),
                    excerpt: Set(input.excerpt.clone()),
                    content: Set(input.content.clone()),
                    cover: Set(input.cover.clone()),
                    user_id: Set(user_id.to_string()),
                    category_id: Set(None),
                    post_id: Set(None),
                    created_at: Set(Utc::now().into()),
                    updated_at: Set(None),
                    ..Default::default()
                };
                self.draft_repo.create_with(txn, model).await?
            }
        };

        let article = self
            .assign_category(txn, Article::Draft(draft), input.category.as_deref())
            .await?;
        self.apply_tags(txn, &article, input.tags.as_deref()).await?;

        Ok(article.id())
    }

    /// Turn a draft into a new post, carrying over its category and tags,
    /// then delete the draft.
    async fn promote(&self, txn: &DatabaseTransaction, draft: draft::Model) -> AppResult<post::Model> {
        let tag_ids = self
            .tag_repo
            .tag_ids_for_with(txn, TagTarget::Draft(draft.id))
            .await?;

        let model = post::ActiveModel {
            title: Set(draft.title.clone()),
            excerpt: Set(draft.excerpt.clone()),
            content: Set(draft.content.clone()),
            cover: Set(draft.cover.clone()),
            views_cnt: Set(0),
            like_cnt: Set(0),
            user_id: Set(draft.user_id.clone()),
            category_id: Set(draft.category_id),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
            ..Default::default()
        };
        let post = self.post_repo.create_with(txn, model).await?;

        for tag_id in tag_ids {
            self.tag_repo
                .attach_with(txn, TagTarget::Post(post.id), tag_id)
                .await?;
        }

        self.draft_repo.delete_with(txn, draft.id).await?;

        debug!(draft_id = draft.id, post_id = post.id, "Draft promoted");
        Ok(post)
    }

    /// Point the article at the owner's category `name`, creating it if needed.
    async fn assign_category<C: ConnectionTrait>(
        &self,
        conn: &C,
        article: Article,
        name: Option<&str>,
    ) -> AppResult<Article> {
        let name = match name.map(normalize_category) {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(article),
        };

        let category = match self
            .category_repo
            .find_by_name_and_user_with(conn, &name, article.user_id())
            .await?
        {
            Some(category) => category,
            None => {
                let model = category::ActiveModel {
                    name: Set(name),
                    user_id: Set(article.user_id().to_string()),
                    created_at: Set(Utc::now().into()),
                    ..Default::default()
                };
                self.category_repo.create_with(conn, model).await?
            }
        };

        if article.category_id() == Some(category.id) {
            return Ok(article);
        }

        Ok(match article {
            Article::Post(p) => {
                let mut active: post::ActiveModel = p.into();
                active.category_id = Set(Some(category.id));
                Article::Post(self.post_repo.update_with(conn, active).await?)
            }
            Article::Draft(d) => {
                let mut active: draft::ActiveModel = d.into();
                active.category_id = Set(Some(category.id));
                Article::Draft(self.draft_repo.update_with(conn, active).await?)
            }
        })
    }

    async fn apply_tags<C>(&self, conn: &C, article: &Article, tags: Option<&[String]>) -> AppResult<()>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let Some(desired) = tags else {
            return Ok(());
        };

        let current: Vec<String> = self
            .tag_repo
            .tags_for_with(conn, article.tag_target())
            .await?
            .into_iter()
            .map(|t| t.name)
            .collect();

        let diff = reconcile_tags(&current, desired);
        if diff.is_empty() {
            return Ok(());
        }

        let report = self.reconciler.apply(conn, article, &diff).await;
        debug!(
            article_id = article.id(),
            added = report.added,
            removed = report.removed,
            skipped = report.skipped,
            "Tags reconciled"
        );
        Ok(())
    }

    // ==================== Delete ====================

    /// Delete one of the caller's posts.
    pub async fn delete_post(&self, user_id: &str, post_id: i64) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = self.delete_post_in(&txn, user_id, post_id).await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, post_id, "Post deleted");
        Ok(())
    }

    async fn delete_post_in(
        &self,
        txn: &DatabaseTransaction,
        user_id: &str,
        post_id: i64,
    ) -> AppResult<()> {
        let post = self
            .post_repo
            .find_by_id_with(txn, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post: {post_id}")))?;
        ensure_owner(&post.user_id, user_id, "delete")?;

        let comment_ids = self.comment_repo.ids_by_post_with(txn, post_id).await?;
        let reply_ids = self.reply_repo.ids_by_post_with(txn, post_id).await?;
        self.like_repo
            .delete_for_targets_with(txn, like::TARGET_COMMENT, &comment_ids)
            .await?;
        self.like_repo
            .delete_for_targets_with(txn, like::TARGET_REPLY, &reply_ids)
            .await?;

        self.post_repo.delete_with(txn, post_id).await
    }

    /// Delete one of the caller's drafts.
    pub async fn delete_draft(&self, user_id: &str, draft_id: i64) -> AppResult<()> {
        let txn = transaction::begin(self.db.as_ref()).await?;
        let result = async {
            let draft = self
                .draft_repo
                .find_by_id_with(&txn, draft_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Draft: {draft_id}")))?;
            ensure_owner(&draft.user_id, user_id, "delete")?;
            self.draft_repo.delete_with(&txn, draft_id).await
        }
        .await;
        transaction::finish(txn, result).await?;

        info!(user_id = %user_id, draft_id, "Draft deleted");
        Ok(())
    }

    // ==================== Read ====================

    /// All posts, newest first.
    pub async fn list_posts(&self, pagination: Pagination) -> AppResult<Paged<PostSummary>> {
        let posts = self.post_repo.list(pagination).await?;
        let total = self.post_repo.count().await?;

        Ok(Paged {
            items: self.summarize_posts(posts).await?,
            total,
            current_page: pagination.page(),
        })
    }

    /// A user's posts, newest first.
    pub async fn list_user_posts(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> AppResult<Paged<PostSummary>> {
        let posts = self.post_repo.list_by_user(user_id, pagination).await?;
        let total = self.post_repo.count_by_user(user_id).await?;

        Ok(Paged {
            items: self.summarize_posts(posts).await?,
            total,
            current_page: pagination.page(),
        })
    }

    /// A user's drafts, newest first.
    pub async fn list_user_drafts(
        &self,
        user_id: &str,
        pagination: Pagination,
    ) -> AppResult<Paged<DraftSummary>> {
        let drafts = self.draft_repo.list_by_user(user_id, pagination).await?;
        let total = self.draft_repo.count_by_user(user_id).await?;

        Ok(Paged {
            items: self.summarize_drafts(user_id, drafts).await?,
            total,
            current_page: pagination.page(),
        })
    }

    /// A post with its author, category, tags and counters. Counts the view.
    pub async fn get_post(&self, post_id: i64) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;

        let mut views = post.views_cnt;
        match self.post_repo.increment_views(post_id).await {
            Ok(()) => views += 1,
            Err(e) => warn!(post_id, error = %e, "Failed to count view"),
        }

        let author = self.user_repo.get_by_id(&post.user_id).await?;
        let category = self.category_name(post.category_id).await?;
        let tags = self.tag_repo.names_for(TagTarget::Post(post.id)).await?;
        let comments = self.comment_repo.count_by_post(post.id).await?;

        Ok(PostDetail {
            id: post.id,
            title: post.title,
            created_at: post.created_at,
            updated_at: post.updated_at,
            excerpt: post.excerpt,
            cover: post.cover,
            category,
            tags,
            views,
            likes: post.like_cnt,
            comments: comments as i64,
            author: AuthorProfile::from(&author),
            content: post.content,
        })
    }

    /// One of the caller's drafts, for editing.
    pub async fn get_draft(&self, user_id: &str, draft_id: i64) -> AppResult<DraftDetail> {
        let draft = self.draft_repo.get_by_id(draft_id).await?;
        ensure_owner(&draft.user_id, user_id, "view")?;

        let author = self.user_repo.get_by_id(&draft.user_id).await?;
        let category = self.category_name(draft.category_id).await?;
        let tags = self.tag_repo.names_for(TagTarget::Draft(draft.id)).await?;

        Ok(DraftDetail {
            id: draft.id,
            title: draft.title,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
            excerpt: draft.excerpt,
            cover: draft.cover,
            category,
            tags,
            author: AuthorProfile::from(&author),
            content: draft.content,
        })
    }

    /// A user's categories, each with its posts.
    pub async fn series(&self, user_id: &str) -> AppResult<Vec<SeriesEntry>> {
        let categories = self.category_repo.list_by_user(user_id).await?;
        let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
        let posts = self.post_repo.list_by_categories(&ids).await?;

        let mut by_category: HashMap<i64, Vec<ArticleBasic>> = HashMap::new();
        for p in posts {
            if let Some(category_id) = p.category_id {
                by_category.entry(category_id).or_default().push(ArticleBasic {
                    id: p.id,
                    title: p.title,
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                });
            }
        }

        Ok(categories
            .into_iter()
            .map(|c| SeriesEntry {
                articles: by_category.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    async fn category_name(&self, category_id: Option<i64>) -> AppResult<String> {
        match category_id {
            Some(id) => Ok(self
                .category_repo
                .find_by_id(id)
                .await?
                .map(|c| c.name)
                .unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    async fn summarize_posts(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostSummary>> {
        if posts.is_empty() {
            return Ok(vec![]);
        }

        let user_ids: Vec<String> = posts.iter().map(|p| p.user_id.clone()).collect();
        let authors: HashMap<String, String> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let category_ids: Vec<i64> = posts.iter().filter_map(|p| p.category_id).collect();
        let categories = self.category_names(&category_ids).await?;

        let post_ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut tags = self.tag_repo.names_for_posts(&post_ids).await?;
        let comments = self.comment_repo.counts_by_posts(&post_ids).await?;

        Ok(posts
            .into_iter()
            .map(|p| PostSummary {
                author: authors.get(&p.user_id).cloned().unwrap_or_default(),
                category: p
                    .category_id
                    .and_then(|id| categories.get(&id).cloned())
                    .unwrap_or_default(),
                tags: tags.remove(&p.id).unwrap_or_default(),
                comments: comments.get(&p.id).copied().unwrap_or(0),
                id: p.id,
                title: p.title,
                created_at: p.created_at,
                updated_at: p.updated_at,
                excerpt: p.excerpt,
                cover: p.cover,
                views: p.views_cnt,
                likes: p.like_cnt,
            })
            .collect())
    }

    async fn summarize_drafts(
        &self,
        user_id: &str,
        drafts: Vec<draft::Model>,
    ) -> AppResult<Vec<DraftSummary>> {
        if drafts.is_empty() {
            return Ok(vec![]);
        }

        let author = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_default();

        let category_ids: Vec<i64> = drafts.iter().filter_map(|d| d.category_id).collect();
        let categories = self.category_names(&category_ids).await?;

        let draft_ids: Vec<i64> = drafts.iter().map(|d| d.id).collect();
        let mut tags = self.tag_repo.names_for_drafts(&draft_ids).await?;

        Ok(drafts
            .into_iter()
            .map(|d| DraftSummary {
                author: author.clone(),
                category: d
                    .category_id
                    .and_then(|id| categories.get(&id).cloned())
                    .unwrap_or_default(),
                tags: tags.remove(&d.id).unwrap_or_default(),
                id: d.id,
                title: d.title,
                created_at: d.created_at,
                updated_at: d.updated_at,
                excerpt: d.excerpt,
                cover: d.cover,
            })
            .collect())
    }

    async fn category_names(&self, ids: &[i64]) -> AppResult<HashMap<i64, String>> {
        Ok(self
            .category_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect())
    }
}

fn normalize_category(raw: &str) -> String {
    normalize_tag(raw)
}

fn ensure_owner(owner_id: &str, user_id: &str, action: &str) -> AppResult<()> {
    if owner_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "You can only {action} your own articles"
        )))
    }
}
