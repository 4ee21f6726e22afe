//! Writer request business logic
//!
//! Approval is the one flow that changes a role without a direct profile
//! update: the reviewing admin's decision promotes the requester to
//! infowriter, notifies them, and publishes the new profile snapshot.

use crate::domain::{
    CreateNotificationInput, CreateWriterRequestInput, Role, WriterRequest, WriterRequestStatus,
};
use crate::error::{AppError, Result};
use crate::repository::{NotificationRepository, UserRepository, WriterRequestRepository};
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use crate::session::ProfileEvents;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

pub struct WriterRequestService<
    W: WriterRequestRepository,
    U: UserRepository,
    N: NotificationRepository,
> {
    repo: Arc<W>,
    users: Arc<U>,
    notifications: Arc<N>,
    events: Arc<ProfileEvents>,
}

impl<W: WriterRequestRepository, U: UserRepository, N: NotificationRepository>
    WriterRequestService<W, U, N>
{
    pub fn new(
        repo: Arc<W>,
        users: Arc<U>,
        notifications: Arc<N>,
        events: Arc<ProfileEvents>,
    ) -> Self {
        Self {
            repo,
            users,
            notifications,
            events,
        }
    }

    pub async fn create(
        &self,
        auth: Option<&Caller>,
        input: CreateWriterRequestInput,
    ) -> Result<WriterRequest> {
        input.validate()?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let id = uuid::Uuid::new_v4().to_string();
        let incoming = json!({"userId": input.user_id});
        rules::evaluate(
            Collection::WriterRequests,
            Operation::Create,
            auth,
            role,
            DocumentRef::new(&id).with_incoming(&incoming),
        )?;

        if matches!(role, Some(Role::Infowriter) | Some(Role::Admin)) {
            return Err(AppError::Conflict(
                "Caller already has writer privileges".to_string(),
            ));
        }
        if self
            .repo
            .find_pending_for_user(&input.user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "A pending writer request already exists".to_string(),
            ));
        }

        self.repo.create(&id, &input).await
    }

    pub async fn get(&self, auth: Option<&Caller>, id: &str) -> Result<WriterRequest> {
        let request = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Writer request {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": request.user_id, "status": request.status});
        rules::evaluate(
            Collection::WriterRequests,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        Ok(request)
    }

    /// List requests; non-admins only see their own rows.
    pub async fn list(
        &self,
        auth: Option<&Caller>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<WriterRequest>, i64)> {
        let role = super::caller_role(self.users.as_ref(), auth).await?;
        rules::evaluate(
            Collection::WriterRequests,
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
        let requests = self.repo.list(scope, offset, limit).await?;
        let total = self.repo.count(scope).await?;
        Ok((requests, total))
    }

    pub async fn approve(&self, auth: &Caller, id: &str) -> Result<WriterRequest> {
        let request = self
            .review(auth, id, WriterRequestStatus::Approved)
            .await?;

        // Promote, unless the requester already outranks infowriter
        match self.users.find_by_uid(&request.user_id).await? {
            Some(user) if user.role == Role::User => {
                let promoted = self
                    .users
                    .set_role(&request.user_id, Role::Infowriter, None)
                    .await?;
                self.events.publish(&promoted);
            }
            Some(_) => {}
            None => {
                warn!(user_id = %request.user_id, "Approved a request for a missing profile");
            }
        }

        self.notify(
            &request.user_id,
            "Writer access approved",
            "Your request for writer access was approved. You can now publish articles.",
        )
        .await;

        Ok(request)
    }

    pub async fn deny(&self, auth: &Caller, id: &str) -> Result<WriterRequest> {
        let request = self.review(auth, id, WriterRequestStatus::Denied).await?;

        self.notify(
            &request.user_id,
            "Writer access denied",
            "Your request for writer access was denied.",
        )
        .await;

        Ok(request)
    }

    pub async fn delete(&self, auth: Option<&Caller>, id: &str) -> Result<()> {
        let request = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Writer request {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), auth).await?;
        let existing = json!({"userId": request.user_id, "status": request.status});
        rules::evaluate(
            Collection::WriterRequests,
            Operation::Delete,
            auth,
            role,
            DocumentRef::new(id).with_existing(&existing),
        )?;

        self.repo.delete(id).await
    }

    async fn review(
        &self,
        auth: &Caller,
        id: &str,
        status: WriterRequestStatus,
    ) -> Result<WriterRequest> {
        let request = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Writer request {} not found", id)))?;

        let role = super::caller_role(self.users.as_ref(), Some(auth)).await?;
        let existing = json!({"userId": request.user_id, "status": request.status});
        let incoming = json!({"status": status});
        rules::evaluate(
            Collection::WriterRequests,
            Operation::Update,
            Some(auth),
            role,
            DocumentRef::new(id)
                .with_existing(&existing)
                .with_incoming(&incoming),
        )?;

        if request.status != WriterRequestStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Writer request {} was already reviewed",
                id
            )));
        }

        self.repo.set_status(id, status, &auth.uid, Utc::now()).await
    }

    /// Notification delivery is best effort; a failed insert never rolls
    /// back the review itself.
    async fn notify(&self, user_id: &str, title: &str, body: &str) {
        let input = CreateNotificationInput {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };
        let id = uuid::Uuid::new_v4().to_string();
        if let Err(err) = self.notifications.create(&id, &input).await {
            warn!(user_id = %user_id, error = %err, "Failed to deliver review notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Notification, User};
    use crate::repository::{
        MockNotificationRepository, MockUserRepository, MockWriterRequestRepository,
    };

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

    fn pending(id: &str, user_id: &str) -> WriterRequest {
        WriterRequest {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status: WriterRequestStatus::Pending,
            ..Default::default()
        }
    }

    fn service(
        repo: MockWriterRequestRepository,
        users: MockUserRepository,
        notifications: MockNotificationRepository,
    ) -> WriterRequestService<
        MockWriterRequestRepository,
        MockUserRepository,
        MockNotificationRepository,
    > {
        WriterRequestService::new(
            Arc::new(repo),
            Arc::new(users),
            Arc::new(notifications),
            Arc::new(ProfileEvents::new()),
        )
    }

    #[tokio::test]
    async fn test_create_own_request() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_pending_for_user().returning(|_| Ok(None));
        repo.expect_create()
            .returning(|id, input| Ok(pending(id, &input.user_id)));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let input = CreateWriterRequestInput {
            user_id: "U1".to_string(),
            message: Some("I write about databases".to_string()),
        };
        let request = service(repo, users, MockNotificationRepository::new())
            .create(Some(&caller("U1")), input)
            .await
            .unwrap();
        assert_eq!(request.status, WriterRequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_for_other_user_denied() {
        let repo = MockWriterRequestRepository::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let input = CreateWriterRequestInput {
            user_id: "U2".to_string(),
            message: None,
        };
        let err = service(repo, users, MockNotificationRepository::new())
            .create(Some(&caller("U1")), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_create_with_pending_request_conflicts() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_pending_for_user()
            .returning(|user_id| Ok(Some(pending("WR1", user_id))));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        let input = CreateWriterRequestInput {
            user_id: "U1".to_string(),
            message: None,
        };
        let err = service(repo, users, MockNotificationRepository::new())
            .create(Some(&caller("U1")), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_approve_promotes_and_notifies() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(pending(id, "U1"))));
        repo.expect_set_status()
            .withf(|_, status, reviewed_by, _| {
                *status == WriterRequestStatus::Approved && reviewed_by == "admin"
            })
            .returning(|id, status, reviewed_by, reviewed_at| {
                let mut request = pending(id, "U1");
                request.status = status;
                request.reviewed_by = Some(reviewed_by.to_string());
                request.reviewed_at = Some(reviewed_at);
                Ok(request)
            });
        let mut users = MockUserRepository::new();
        users.expect_find_by_uid().returning(|uid| {
            let role = if uid == "admin" { Role::Admin } else { Role::User };
            Ok(Some(profile(uid, role)))
        });
        users
            .expect_set_role()
            .withf(|uid, role, removed_at| {
                uid == "U1" && *role == Role::Infowriter && removed_at.is_none()
            })
            .times(1)
            .returning(|uid, role, _| Ok(profile(uid, role)));
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_create()
            .withf(|_, input| input.user_id == "U1")
            .times(1)
            .returning(|id, input| {
                Ok(Notification {
                    id: id.to_string(),
                    user_id: input.user_id.clone(),
                    title: input.title.clone(),
                    body: input.body.clone(),
                    ..Default::default()
                })
            });

        let request = service(repo, users, notifications)
            .approve(&caller("admin"), "WR1")
            .await
            .unwrap();
        assert_eq!(request.status, WriterRequestStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_requires_admin() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(pending(id, "U1"))));
        repo.expect_set_status().times(0);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Infowriter))));

        let err = service(repo, users, MockNotificationRepository::new())
            .approve(&caller("U2"), "WR1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_deny_leaves_role_untouched() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(pending(id, "U1"))));
        repo.expect_set_status()
            .returning(|id, status, reviewed_by, reviewed_at| {
                let mut request = pending(id, "U1");
                request.status = status;
                request.reviewed_by = Some(reviewed_by.to_string());
                request.reviewed_at = Some(reviewed_at);
                Ok(request)
            });
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));
        users.expect_set_role().times(0);
        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_create()
            .times(1)
            .returning(|_, _| Ok(Notification::default()));

        let request = service(repo, users, notifications)
            .deny(&caller("admin"), "WR1")
            .await
            .unwrap();
        assert_eq!(request.status, WriterRequestStatus::Denied);
    }

    #[tokio::test]
    async fn test_reviewed_request_cannot_be_rereviewed() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let mut request = pending(id, "U1");
            request.status = WriterRequestStatus::Denied;
            Ok(Some(request))
        });
        repo.expect_set_status().times(0);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::Admin))));

        let err = service(repo, users, MockNotificationRepository::new())
            .approve(&caller("admin"), "WR1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_scopes_non_admin_to_own_rows() {
        let mut repo = MockWriterRequestRepository::new();
        repo.expect_list()
            .withf(|scope, _, _| *scope == Some("U1"))
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_count().returning(|_| Ok(0));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_uid()
            .returning(|uid| Ok(Some(profile(uid, Role::User))));

        assert!(service(repo, users, MockNotificationRepository::new())
            .list(Some(&caller("U1")), 0, 20)
            .await
            .is_ok());
    }
}
