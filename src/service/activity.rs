//! User activity business logic
//!
//! Activity rows are append-only; there is deliberately no update or
//! delete surface at any layer.

use crate::domain::{RecordActivityInput, Role, UserActivity};
use crate::error::{AppError, Result};
use crate::repository::{ActivityRepository, UserRepository};
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

pub struct ActivityService<A: ActivityRepository, U: UserRepository> {
    repo: Arc<A>,
    users: Arc<U>,
}

impl<A: ActivityRepository, U: UserRepository> ActivityService<A, U> {
    pub fn new(repo: Arc<A>, users: Arc<U>) -> Self {
        Self { repo, users }
    }

    /// Record an event under the caller's own uid.
    pub async fn record(&self, auth: &Caller, input: RecordActivityInput) -> Result<UserActivity> {
        input.validate()?;

        let role = super::caller_role(self.users.as_ref(), Some(auth)).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let incoming = json!({"userId": auth.uid, "action": input.action});
        rules::evaluate(
            Collection::UserActivity,
            Operation::Create,
            Some(auth),
            role,
            DocumentRef::new(&id).with_incoming(&incoming),
        )?;

        self.repo.create(&id, &auth.uid, &input).await
    }

    pub async fn get(&self, auth: Option<&Caller>, id: &str) -> Result<UserActivity> {
        let activity = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": activity.user_id});
        rules::evaluate(
            Collection::UserActivity,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        Ok(activity)
    }

    pub async fn list(
        &self,
        auth: Option<&Caller>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<UserActivity>, i64)> {
        let role = super::caller_role(self.users.as_ref(), auth).await?;
        rules::evaluate(
            Collection::UserActivity,
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
        let activities = self.repo.list(scope, offset, limit).await?;
        let total = self.repo.count(scope).await?;
        Ok((activities, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::repository::{MockActivityRepository, MockUserRepository};

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

    fn activity(id: &str, user_id: &str) -> UserActivity {
        UserActivity {
            id: id.to_string(),
            user_id: user_id.to_string(),
            action: "article_view".to_string(),
            ..Default::default()
        }
    }

    fn service(
        repo: MockActivityRepository,
        users: MockUserRepository,
    ) -> ActivityService<MockActivityRepository, MockUserRepository> {
        ActivityService::new(Arc::new(repo), Arc::new(users))
    }

    #[tokio::test]
    async fn test_record_uses_caller_uid() {
        let mut repo = MockActivityRepository::new();
        repo.expect_create()
            .withf(|_, user_id, input| user_id == "U1" && input.action == "article_view")
            .returning(|id, user_id, _| Ok(activity(id, user_id)));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let input = RecordActivityInput {
            action: "article_view".to_string(),
            target_id: Some("A1".to_string()),
        };
        let recorded = service(repo, users)
            .record(&caller("U1"), input)
            .await
            .unwrap();
        assert_eq!(recorded.user_id, "U1");
    }

    #[tokio::test]
    async fn test_get_foreign_activity_denied() {
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(activity(id, "U1"))));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let err = service(repo, users)
            .get(Some(&caller("U2")), "E1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_reads_all_activity() {
        let mut repo = MockActivityRepository::new();
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

    #[tokio::test]
    async fn test_list_requires_auth() {
        let repo = MockActivityRepository::new();
        let users = MockUserRepository::new();

        let err = service(repo, users).list(None, 0, 20).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
