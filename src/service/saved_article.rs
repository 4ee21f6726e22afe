//! Saved article (bookmark) business logic
//!
//! Bookmark ids are the compound `{uid}_{articleId}` form, so saving the
//! same article twice is an idempotent upsert and ownership is readable
//! from the id alone.

use crate::domain::{Role, SavedArticle};
use crate::error::{AppError, Result};
use crate::repository::{ArticleRepository, SavedArticleRepository, UserRepository};
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use serde_json::json;
use std::sync::Arc;

pub struct SavedArticleService<
    S: SavedArticleRepository,
    A: ArticleRepository,
    U: UserRepository,
> {
    repo: Arc<S>,
    articles: Arc<A>,
    users: Arc<U>,
}

impl<S: SavedArticleRepository, A: ArticleRepository, U: UserRepository>
    SavedArticleService<S, A, U>
{
    pub fn new(repo: Arc<S>, articles: Arc<A>, users: Arc<U>) -> Self {
        Self {
            repo,
            articles,
            users,
        }
    }

    pub async fn save(&self, auth: &Caller, article_id: &str) -> Result<SavedArticle> {
        let role = super::caller_role(self.users.as_ref(), Some(auth)).await?;
        let id = SavedArticle::compound_id(&auth.uid, article_id);
        let incoming = json!({"userId": auth.uid, "articleId": article_id});
        rules::evaluate(
            Collection::SavedArticles,
            Operation::Create,
            Some(auth),
            role,
            DocumentRef::new(&id).with_incoming(&incoming),
        )?;

        if self.articles.find_by_id(article_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Article {} not found",
                article_id
            )));
        }

        self.repo.save(&id, &auth.uid, article_id).await
    }

    pub async fn get(&self, auth: Option<&Caller>, id: &str) -> Result<SavedArticle> {
        let saved = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saved article {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": saved.user_id});
        rules::evaluate(
            Collection::SavedArticles,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        Ok(saved)
    }

    pub async fn list(
        &self,
        auth: Option<&Caller>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<SavedArticle>, i64)> {
        let role = super::caller_role(self.users.as_ref(), auth).await?;
        rules::evaluate(
            Collection::SavedArticles,
            Operation::List,
            auth,
            role,
            DocumentRef::default(),
        )?;

        let scope = match (auth, role) {
            (_, Some(Role::Admin)) => None,
            (Some(caller), _) => Some(caller.uid.as_str()),
            (None, _) => None,
        };
        let saved = self.repo.list(scope, offset, limit).await?;
        let total = self.repo.count(scope).await?;
        Ok((saved, total))
    }

    pub async fn delete(&self, auth: Option<&Caller>, id: &str) -> Result<()> {
        let saved = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Saved article {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": saved.user_id});
        rules::evaluate(
            Collection::SavedArticles,
            Operation::Delete,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        self.repo.delete(id).await
    }
}
