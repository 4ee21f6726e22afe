//! Business logic services
//!
//! Every service resolves the caller's stored role, evaluates the
//! collection rule, and only then touches the repository. The rule sees
//! the document through a small JSON view built from the entity, so the
//! predicates compare the same field names the API exposes.

pub mod activity;
pub mod article;
pub mod notification;
pub mod saved_article;
pub mod user;
pub mod writer_request;

pub use activity::ActivityService;
pub use article::ArticleService;
pub use notification::NotificationService;
pub use saved_article::SavedArticleService;
pub use user::UserService;
pub use writer_request::WriterRequestService;

use crate::domain::Role;
use crate::error::Result;
use crate::repository::UserRepository;
use crate::rules::Caller;

/// Resolve the role stored on the caller's own profile.
///
/// A caller without a profile document evaluates with no role, which
/// never grants elevated access.
pub(crate) async fn caller_role<U: UserRepository>(
    users: &U,
    auth: Option<&Caller>,
) -> Result<Option<Role>> {
    match auth {
        Some(caller) => Ok(users.find_by_uid(&caller.uid).await?.map(|u| u.role)),
        None => Ok(None),
    }
}
