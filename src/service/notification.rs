//! Notification business logic

use crate::domain::{CreateNotificationInput, Notification, Role};
use crate::error::{AppError, Result};
use crate::repository::{NotificationRepository, UserRepository};
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

pub struct NotificationService<N: NotificationRepository, U: UserRepository> {
    repo: Arc<N>,
    users: Arc<U>,
}

impl<N: NotificationRepository, U: UserRepository> NotificationService<N, U> {
    pub fn new(repo: Arc<N>, users: Arc<U>) -> Self {
        Self { repo, users }
    }

    pub async fn create(
        &self,
        auth: Option<&Caller>,
        input: CreateNotificationInput,
    ) -> Result<Notification> {
        input.validate()?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let incoming = json!({"userId": input.user_id});
        rules::evaluate(
            Collection::Notifications,
            Operation::Create,
            auth,
            role,
            DocumentRef::new(&id).with_incoming(&incoming),
        )?;

        self.repo.create(&id, &input).await
    }

    pub async fn get(&self, auth: Option<&Caller>, id: &str) -> Result<Notification> {
        let notification = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": notification.user_id});
        rules::evaluate(
            Collection::Notifications,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        Ok(notification)
    }

    pub async fn list(
        &self,
        auth: Option<&Caller>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let role = super::caller_role(self.users.as_ref(), auth).await?;
        rules::evaluate(
            Collection::Notifications,
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
        let notifications = self.repo.list(scope, offset, limit).await?;
        let total = self.repo.count(scope).await?;
        Ok((notifications, total))
    }

    /// Mark as read. Recipient only; admins hold no override on
    /// notification mutations.
    pub async fn mark_read(&self, auth: Option<&Caller>, id: &str) -> Result<Notification> {
        let notification = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": notification.user_id});
        let incoming = json!({"userId": notification.user_id, "read": true});
        rules::evaluate(
            Collection::Notifications,
            Operation::Update,
            auth,
            role,
            DocumentRef::new(id)
                .with_existing(&existing)
                .with_incoming(&incoming),
        )?;

        self.repo.mark_read(id).await
    }

    pub async fn delete(&self, auth: Option<&Caller>, id: &str) -> Result<()> {
        let notification = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": notification.user_id});
        rules::evaluate(
            Collection::Notifications,
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
    use crate::domain::User;
    use crate::repository::{MockNotificationRepository, MockUserRepository};

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

    fn notification(id: &str, user_id: &str) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
            ..Default::default()
        }
    }

    fn input(user_id: &str) -> CreateNotificationInput {
        CreateNotificationInput {
            user_id: user_id.to_string(),
            title: "Title".to_string(),
            body: "Body".to_string(),
        }
    }

    fn service(
        repo: MockNotificationRepository,
        users: MockUserRepository,
    ) -> NotificationService<MockNotificationRepository, MockUserRepository> {
        NotificationService::new(Arc::new(repo), Arc::new(users))
    }

    #[tokio::test]
    async fn test_create_for_self() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_create()
            .returning(|id, input| Ok(notification(id, &input.user_id)));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        assert!(service(repo, users)
            .create(Some(&caller("U1")), input("U1"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_create_for_other_requires_admin() {
        let repo = MockNotificationRepository::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Infowriter))));

        let err = service(repo, users)
            .create(Some(&caller("U1")), input("U2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_mark_read_by_recipient() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(notification(id, "U1"))));
        repo.expect_mark_read().returning(|id| {
            let mut n = notification(id, "U1");
            n.is_read = true;
            Ok(n)
        });
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let updated = service(repo, users)
            .mark_read(Some(&caller("U1")), "N1")
            .await
            .unwrap();
        assert!(updated.is_read);
    }

    #[tokio::test]
    async fn test_admin_cannot_mutate_foreign_notification() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(notification(id, "U1"))));
        repo.expect_delete().times(0);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));

        let err = service(repo, users)
            .delete(Some(&caller("admin")), "N1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_list_is_unscoped() {
        let mut repo = MockNotificationRepository::new();
        repo.expect_list()
            .withf(|scope, _, _| scope.is_none())
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count().returning(|_| Ok(0));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));

        assert!(service(repo, users)
            .list(Some(&caller("admin")), 0, 20)
            .await
            .is_ok());
    }
}
