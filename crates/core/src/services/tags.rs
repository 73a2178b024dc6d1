//! Tag reconciliation.
//!
//! [`reconcile_tags`] computes which tags to add to and remove from an
//! article. [`TagReconciler`] applies that difference, one savepoint per
//! tag, so a failing tag is skipped without aborting the surrounding
//! transaction.

use std::collections::HashSet;

use blog_common::AppResult;
use blog_db::{repositories::TagRepository, transaction};
use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::warn;

use super::article::Article;

/// Tags to add to and remove from an article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    /// Normalized names not yet on the article, in request order.
    pub to_add: Vec<String>,
    /// Current names missing from the request.
    pub to_remove: Vec<String>,
}

impl TagDiff {
    /// Whether applying this diff would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Outcome of applying a [`TagDiff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub skipped: usize,
}

/// Normalize a requested tag name.
#[must_use]
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Diff an article's current tags against a requested list.
///
/// `current` holds names as stored (already lowercase). Requested names are
/// trimmed and lowercased; blank entries are ignored.
#[must_use]
pub fn reconcile_tags<S: AsRef<str>>(current: &[String], desired: &[S]) -> TagDiff {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();

    let mut desired_set = HashSet::new();
    let mut to_add = Vec::new();
    for raw in desired {
        let name = normalize_tag(raw.as_ref());
        if name.is_empty() {
            continue;
        }
        if !current_set.contains(name.as_str()) && !desired_set.contains(&name) {
            to_add.push(name.clone());
        }
        desired_set.insert(name);
    }

    let mut seen = HashSet::new();
    let to_remove = current
        .iter()
        .filter(|name| !desired_set.contains(name.as_str()) && seen.insert(name.as_str()))
        .cloned()
        .collect();

    TagDiff { to_add, to_remove }
}

/// Applies tag diffs to articles.
#[derive(Clone)]
pub struct TagReconciler {
    tag_repo: TagRepository,
}

impl TagReconciler {
    #[must_use]
    pub const fn new(tag_repo: TagRepository) -> Self {
        Self { tag_repo }
    }

    /// Apply `diff` to `article`. Failures are logged and counted as skipped.
    pub async fn apply<C>(&self, conn: &C, article: &Article, diff: &TagDiff) -> ReconcileReport
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let mut report = ReconcileReport::default();

        for name in &diff.to_remove {
            match self.remove_one(conn, article, name).await {
                Ok(true) => report.removed += 1,
                Ok(false) => {
                    warn!(tag = %name, article_id = article.id(), "Tag to remove does not exist");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(tag = %name, article_id = article.id(), error = %e, "Failed to remove tag");
                    report.skipped += 1;
                }
            }
        }

        for name in &diff.to_add {
            match self.add_one(conn, article, name).await {
                Ok(()) => report.added += 1,
                Err(e) => {
                    warn!(tag = %name, article_id = article.id(), error = %e, "Failed to add tag");
                    report.skipped += 1;
                }
            }
        }

        report
    }

    async fn remove_one<C: TransactionTrait>(
        &self,
        conn: &C,
        article: &Article,
        name: &str,
    ) -> AppResult<bool> {
        let savepoint = transaction::begin(conn).await?;
        let result = async {
            match self.tag_repo.find_by_name_with(&savepoint, name).await? {
                Some(tag) => {
                    self.tag_repo
                        .detach_with(&savepoint, article.tag_target(), tag.id)
                        .await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        .await;
        transaction::finish(savepoint, result).await
    }

    async fn add_one<C: TransactionTrait>(
        &self,
        conn: &C,
        article: &Article,
        name: &str,
    ) -> AppResult<()> {
        let savepoint = transaction::begin(conn).await?;
        let result = async {
            let tag = self.tag_repo.get_or_create_with(&savepoint, name).await?;
            self.tag_repo
                .attach_with(&savepoint, article.tag_target(), tag.id)
                .await
        }
        .await;
        transaction::finish(savepoint, result).await
    }
}
