//! User profile business logic
//!
//! Mutations publish a fresh profile snapshot so subscribed sessions
//! recompute their permission sets immediately instead of waiting for
//! the cache TTL.

use crate::domain::{CreateUserInput, Role, UpdateUserInput, User};
use crate::error::{AppError, Result};
use crate::repository::UserRepository;
use crate::rules::{self, Caller, Collection, DocumentRef, Operation};
use crate::session::ProfileEvents;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

pub struct UserService<U: UserRepository> {
    repo: Arc<U>,
    events: Arc<ProfileEvents>,
}

fn rank(role: Role) -> u8 {
    match role {
        Role::User => 0,
        Role::Infowriter => 1,
        Role::Admin => 2,
    }
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: Arc<U>, events: Arc<ProfileEvents>) -> Self {
        Self { repo, events }
    }

    /// Create the caller's own profile document.
    pub async fn create(&self, auth: Option<&Caller>, input: CreateUserInput) -> Result<User> {
        input.validate()?;

        let role = super::caller_role(self.repo.as_ref(), auth).await?;
        let incoming = json!({"email": input.email});
        rules::evaluate(
            Collection::Users,
            Operation::Create,
            auth,
            role,
            DocumentRef::new(&input.uid).with_incoming(&incoming),
        )?;

        if self.repo.find_by_uid(&input.uid).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Profile for uid '{}' already exists",
                input.uid
            )));
        }

        let user = self.repo.create(&input).await?;
        self.events.publish(&user);
        Ok(user)
    }

    pub async fn get(&self, auth: Option<&Caller>, uid: &str) -> Result<User> {
        let role = super::caller_role(self.repo.as_ref(), auth).await?;
        rules::evaluate(
            Collection::Users,
            Operation::Get,
            auth,
            role,
            DocumentRef::new(uid),
        )?;

        self.repo
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))
    }

    pub async fn list(
        &self,
        auth: Option<&Caller>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<User>, i64)> {
        let role = super::caller_role(self.repo.as_ref(), auth).await?;
        rules::evaluate(
            Collection::Users,
            Operation::List,
            auth,
            role,
            DocumentRef::default(),
        )?;

        let users = self.repo.list(offset, limit).await?;
        let total = self.repo.count().await?;
        Ok((users, total))
    }

    /// Update a profile. A role change is applied as a separate step so
    /// the demotion bookkeeping (previous role, removal timestamp) stays
    /// in one place.
    pub async fn update(
        &self,
        auth: Option<&Caller>,
        uid: &str,
        input: UpdateUserInput,
    ) -> Result<User> {
        input.validate()?;

        let current = self
            .repo
            .find_by_uid(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;

        let caller_role = super::caller_role(self.repo.as_ref(), auth).await?;
        let existing = json!({"role": current.role.as_str()});
        let incoming = match input.role {
            Some(role) => json!({"role": role.as_str()}),
            None => json!({}),
        };
        rules::evaluate(
            Collection::Users,
            Operation::Update,
            auth,
            caller_role,
            DocumentRef::new(uid)
                .with_existing(&existing)
                .with_incoming(&incoming),
        )?;

        let mut user = self.repo.update(uid, &input).await?;

        if let Some(new_role) = input.role {
            if new_role != current.role {
                let removed_at =
                    (rank(new_role) < rank(current.role)).then(Utc::now);
                user = self.repo.set_role(uid, new_role, removed_at).await?;
            }
        }

        self.events.publish(&user);
        Ok(user)
    }

    pub async fn delete(&self, auth: Option<&Caller>, uid: &str) -> Result<()> {
        let role = super::caller_role(self.repo.as_ref(), auth).await?;
        rules::evaluate(
            Collection::Users,
            Operation::Delete,
            auth,
            role,
            DocumentRef::new(uid),
        )?;

        self.repo.delete(uid).await?;
        self.events.publish_removed(uid);
        Ok(())
    }
}
