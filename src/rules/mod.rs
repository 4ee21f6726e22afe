//! Declarative per-collection authorization rules.
//!
//! Every storage operation is authorized by a pure predicate over the
//! operation kind, the caller identity, the caller's stored role, and the
//! existing/proposed document. The predicate never touches storage: the one
//! cross-collection dependency (the caller's own profile role) is resolved
//! by the service layer immediately before evaluation and passed in, so the
//! role read and the decision form a single authorization step.
//!
//! A denial rejects the whole operation; there are no partial writes and a
//! denied operation is not retryable without a role or ownership change.

use crate::domain::Role;
use crate::error::AppError;
use serde_json::Value;

pub type RuleResult = std::result::Result<(), AppError>;

/// The five request kinds evaluated by the rule engine. "write" in rule
/// prose means create, update, or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    List,
    Create,
    Update,
    Delete,
}

/// Collections subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Articles,
    Users,
    WriterRequests,
    SavedArticles,
    Notifications,
    UserActivity,
}

/// Authenticated caller identity, as supplied by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

/// The document under decision.
///
/// `existing` is the stored state (absent on create), `incoming` the
/// proposed state (absent on get/delete). Both are untyped values so the
/// predicates compare fields exactly as written, including field absence.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRef<'a> {
    pub id: &'a str,
    pub existing: Option<&'a Value>,
    pub incoming: Option<&'a Value>,
}

impl<'a> DocumentRef<'a> {
    pub fn new(id: &'a str) -> Self {
        Self {
            id,
            existing: None,
            incoming: None,
        }
    }

    pub fn with_existing(mut self, existing: &'a Value) -> Self {
        self.existing = Some(existing);
        self
    }

    pub fn with_incoming(mut self, incoming: &'a Value) -> Self {
        self.incoming = Some(incoming);
        self
    }
}

/// Evaluate the rule for one operation against one collection.
///
/// `caller_role` is the role stored on the caller's own profile document,
/// or `None` when the caller has no profile; a missing profile never grants
/// elevated access.
pub fn evaluate(
    collection: Collection,
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match collection {
        Collection::Articles => allow_articles(op, auth, caller_role, doc),
        Collection::Users => allow_users(op, auth, caller_role, doc),
        Collection::WriterRequests => allow_writer_requests(op, auth, caller_role, doc),
        Collection::SavedArticles => allow_saved_articles(op, auth, caller_role, doc),
        Collection::Notifications => allow_notifications(op, auth, caller_role, doc),
        Collection::UserActivity => allow_user_activity(op, auth, caller_role, doc),
    }
}

fn allow_articles(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        Operation::Get => {
            if str_field(doc.existing, "status") == Some("published") {
                return Ok(());
            }
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "authorId") || is_admin(caller_role) {
                Ok(())
            } else {
                deny("Only the author or an admin can read an unpublished article")
            }
        }
        // Row-level visibility is the query's responsibility
        Operation::List => Ok(()),
        Operation::Create => {
            let caller = require_auth(auth)?;
            if !matches!(caller_role, Some(Role::Infowriter) | Some(Role::Admin)) {
                return deny("Writer privileges required to create articles");
            }
            // No admin bypass here: authoring on behalf of others is denied
            // for every role.
            if str_field(doc.incoming, "authorId") == Some(caller.uid.as_str()) {
                Ok(())
            } else {
                deny("authorId must equal the caller's uid")
            }
        }
        Operation::Update | Operation::Delete => {
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "authorId") || is_admin(caller_role) {
                Ok(())
            } else {
                deny("Only the author or an admin can modify this article")
            }
        }
    }
}

fn allow_users(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        // Any authenticated identity may read profiles (author bylines)
        Operation::Get | Operation::List => require_auth(auth).map(|_| ()),
        Operation::Create => {
            let caller = require_auth(auth)?;
            if doc.id == caller.uid {
                Ok(())
            } else {
                deny("A profile can only be created under the caller's own uid")
            }
        }
        Operation::Update => {
            let caller = require_auth(auth)?;
            if is_admin(caller_role) {
                return Ok(());
            }
            if doc.id != caller.uid {
                return deny("Only the profile owner or an admin can update a profile");
            }
            // Role immutability by self: the proposed role must be absent or
            // byte-equal to the stored value.
            match str_field(doc.incoming, "role") {
                None => Ok(()),
                proposed if proposed == str_field(doc.existing, "role") => Ok(()),
                _ => deny("Only an admin can change a user's role"),
            }
        }
        Operation::Delete => {
            require_auth(auth)?;
            if is_admin(caller_role) {
                Ok(())
            } else {
                deny("Admin access required to delete a profile")
            }
        }
    }
}

fn allow_writer_requests(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        Operation::Create => {
            let caller = require_auth(auth)?;
            if str_field(doc.incoming, "userId") == Some(caller.uid.as_str()) {
                Ok(())
            } else {
                deny("A writer request can only be filed for the caller's own uid")
            }
        }
        Operation::Get => {
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "userId") || is_admin(caller_role) {
                Ok(())
            } else {
                deny("Only the requester or an admin can read this request")
            }
        }
        // Queries are scoped to the caller's own rows unless admin
        Operation::List => require_auth(auth).map(|_| ()),
        Operation::Update | Operation::Delete => {
            require_auth(auth)?;
            if is_admin(caller_role) {
                Ok(())
            } else {
                deny("Admin access required to review writer requests")
            }
        }
    }
}

fn allow_saved_articles(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        // Filtering to the caller's own rows is the query's responsibility
        Operation::List => require_auth(auth).map(|_| ()),
        Operation::Get | Operation::Create | Operation::Update | Operation::Delete => {
            let caller = require_auth(auth)?;
            if is_admin(caller_role) {
                return Ok(());
            }
            if owns_saved_article(caller, doc) {
                Ok(())
            } else {
                deny("Only the owner can access this bookmark")
            }
        }
    }
}

/// Ownership of a bookmark resolves three ways: id prefix `{uid}_`, the
/// existing document's userId, or the proposed document's userId.
fn owns_saved_article(caller: &Caller, doc: DocumentRef<'_>) -> bool {
    doc.id.starts_with(&format!("{}_", caller.uid))
        || is_owner(caller, doc.existing, "userId")
        || is_owner(caller, doc.incoming, "userId")
}

fn allow_notifications(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        Operation::Get => {
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "userId") || is_admin(caller_role) {
                Ok(())
            } else {
                deny("Only the recipient can read this notification")
            }
        }
        Operation::List => require_auth(auth).map(|_| ()),
        Operation::Create => {
            let caller = require_auth(auth)?;
            if is_admin(caller_role) || str_field(doc.incoming, "userId") == Some(caller.uid.as_str())
            {
                Ok(())
            } else {
                deny("Notifications can only be created by an admin or for oneself")
            }
        }
        // No admin override on mutation: only the recipient manages their
        // notifications.
        Operation::Update | Operation::Delete => {
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "userId") {
                Ok(())
            } else {
                deny("Only the recipient can modify this notification")
            }
        }
    }
}

fn allow_user_activity(
    op: Operation,
    auth: Option<&Caller>,
    caller_role: Option<Role>,
    doc: DocumentRef<'_>,
) -> RuleResult {
    match op {
        Operation::Create | Operation::List => require_auth(auth).map(|_| ()),
        Operation::Get => {
            let caller = require_auth(auth)?;
            if is_owner(caller, doc.existing, "userId") || is_admin(caller_role) {
                Ok(())
            } else {
                deny("Only the owner or an admin can read activity records")
            }
        }
        Operation::Update | Operation::Delete => deny("Activity records are append-only"),
    }
}

fn require_auth(auth: Option<&Caller>) -> Result<&Caller, AppError> {
    auth.ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

fn is_admin(caller_role: Option<Role>) -> bool {
    caller_role == Some(Role::Admin)
}

fn is_owner(caller: &Caller, doc: Option<&Value>, field: &str) -> bool {
    str_field(doc, field) == Some(caller.uid.as_str())
}

fn str_field<'a>(doc: Option<&'a Value>, field: &str) -> Option<&'a str> {
    doc.and_then(|d| d.get(field)).and_then(Value::as_str)
}

fn deny(message: &str) -> RuleResult {
    Err(AppError::Forbidden(message.to_string()))
}
