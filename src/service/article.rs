//! Article business logic

use crate::domain::{Article, ArticleFilter, CreateArticleInput, Role, UpdateArticleInput};
use crate::error::{AppError, Result};
use crate::repository::{ArticleRepository, ArticleVisibility, UserRepository};
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

pub struct ArticleService<A: ArticleRepository, U: UserRepository> {
    repo: Arc<A>,
    users: Arc<U>,
}

/// The fields the article rules inspect
fn auth_view(article: &Article) -> Value {
    json!({
        "authorId": article.author_id,
        "status": article.status.as_str(),
    })
}

impl<A: ArticleRepository, U: UserRepository> ArticleService<A, U> {
    pub fn new(repo: Arc<A>, users: Arc<U>) -> Self {
        Self { repo, users }
    }

    pub async fn create(&self, auth: Option<&Caller>, input: CreateArticleInput) -> Result<Article> {
        input.validate()?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let incoming = json!({
            "authorId": input.author_id,
            "status": input.status.as_str(),
        });
        rules::evaluate(
            Collection::Articles,
            Operation::Create,
            auth,
            role,
            DocumentRef::new(&id).with_incoming(&incoming),
        )?;

        self.repo.create(&id, &input).await
    }

    pub async fn get(&self, auth: Option<&Caller>, id: &str) -> Result<Article> {
        let article = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = auth_view(&article);
        rules::evaluate(
            Collection::Articles,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        Ok(article)
    }

    /// List articles the caller may see. The rule admits everyone; the
    /// visibility scope does the row filtering.
    pub async fn list(
        &self,
        auth: Option<&Caller>,
        filter: &ArticleFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Article>, i64)> {
        let role = super::caller_role(self.users.as_ref(), auth).await?;
        rules::evaluate(
            Collection::Articles,
            Operation::List,
            auth,
            role,
            DocumentRef::default(),
        )?;

        let visibility = match (auth, role) {
            (_, Some(Role::Admin)) => ArticleVisibility::All,
            (Some(caller), _) => ArticleVisibility::PublishedOrAuthor(caller.uid.clone()),
            (None, _) => ArticleVisibility::PublishedOnly,
        };

        let articles = self.repo.list(&visibility, filter, offset, limit).await?;
        let total = self.repo.count(&visibility, filter).await?;
        Ok((articles, total))
    }

    pub async fn update(
        &self,
        auth: Option<&Caller>,
        id: &str,
        input: UpdateArticleInput,
    ) -> Result<Article> {
        input.validate()?;

        let article = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = auth_view(&article);
        rules::evaluate(
            Collection::Articles,
            Operation::Update,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        self.repo.update(id, &input).await
    }

    pub async fn delete(&self, auth: Option<&Caller>, id: &str) -> Result<()> {
        let article = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = auth_view(&article);
        rules::evaluate(
            Collection::Articles,
            Operation::Delete,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArticleStatus, User};
    use crate::repository::{MockArticleRepository, MockUserRepository};

    fn caller(uid: &str) -> Caller {
        Caller {
            uid: uid.to_string(),
            email: format!("{}@example.com", uid),
            email_verified: true,
        }
    }

    fn profile(uid: &str, role: Role) -> User {
        User {
            uid: uid.to_string(),
            role,
            ..Default::default()
        }
    }

    fn article(id: &str, author: &str, status: ArticleStatus) -> Article {
        Article {
            id: id.to_string(),
            author_id: author.to_string(),
            status,
            ..Default::default()
        }
    }

    fn create_input(author: &str) -> CreateArticleInput {
        CreateArticleInput {
            author_id: author.to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            status: ArticleStatus::Draft,
            category: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_denied_for_plain_user() {
        let articles = MockArticleRepository::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let err = service
            .create(Some(&caller("U1")), create_input("U1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_allowed_for_infowriter() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_create()
            .returning(|id, input| Ok(article(id, &input.author_id, input.status)));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Infowriter))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let created = service
            .create(Some(&caller("U1")), create_input("U1"))
            .await
            .unwrap();
        assert_eq!(created.author_id, "U1");
    }

    #[tokio::test]
    async fn test_admin_cannot_author_for_someone_else() {
        let articles = MockArticleRepository::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let err = service
            .create(Some(&caller("admin")), create_input("U1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_get_published_works_anonymously() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_find_by_id()
            .returning(|id| Ok(Some(article(id, "U1", ArticleStatus::Published))));
        let users = MockUserRepository::new();

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        assert!(service.get(None, "A1").await.is_ok());
    }

    #[tokio::test]
    async fn test_get_draft_denied_for_stranger() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_find_by_id()
            .returning(|id| Ok(Some(article(id, "U1", ArticleStatus::Draft))));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Infowriter))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let err = service.get(Some(&caller("U2")), "A1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_scopes_by_caller() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_list()
            .withf(|visibility, _, _, _| {
                *visibility == ArticleVisibility::PublishedOrAuthor("U1".to_string())
            })
            .returning(|_, _, _, _| Ok(vec![]));
        articles.expect_count().returning(|_, _| Ok(0));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let (rows, total) = service
            .list(Some(&caller("U1")), &ArticleFilter::default(), 0, 20)
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_list_anonymous_sees_published_only() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_list()
            .withf(|visibility, _, _, _| *visibility == ArticleVisibility::PublishedOnly)
            .returning(|_, _, _, _| Ok(vec![]));
        articles.expect_count().returning(|_, _| Ok(0));
        let users = MockUserRepository::new();

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        assert!(service
            .list(None, &ArticleFilter::default(), 0, 20)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_delete_by_admin_non_author() {
        let mut articles = MockArticleRepository::new();
        articles
            .expect_find_by_id()
            .returning(|id| Ok(Some(article(id, "U1", ArticleStatus::Published))));
        articles.expect_delete().returning(|_| Ok(()));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        assert!(service.delete(Some(&caller("admin")), "A1").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_missing_article_is_not_found() {
        let mut articles = MockArticleRepository::new();
        articles.expect_find_by_id().returning(|_| Ok(None));
        let users = MockUserRepository::new();

        let service = ArticleService::new(Arc::new(articles), Arc::new(users));
        let err = service
            .update(Some(&caller("U1")), "missing", UpdateArticleInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
