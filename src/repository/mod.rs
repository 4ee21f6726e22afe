//! Data access layer (Repository pattern)

pub mod activity;
pub mod article;
pub mod notification;
pub mod saved_article;
pub mod user;
pub mod writer_request;

pub use activity::{ActivityRepository, ActivityRepositoryImpl};
pub use article::{ArticleRepository, ArticleRepositoryImpl, ArticleVisibility};
pub use notification::{NotificationRepository, NotificationRepositoryImpl};
pub use saved_article::{SavedArticleRepository, SavedArticleRepositoryImpl};
pub use user::{UserRepository, UserRepositoryImpl};
pub use writer_request::{WriterRequestRepository, WriterRequestRepositoryImpl};

#[cfg(test)]
pub use activity::MockActivityRepository;
#[cfg(test)]
pub use article::MockArticleRepository;
#[cfg(test)]
pub use notification::MockNotificationRepository;
#[cfg(test)]
pub use saved_article::MockSavedArticleRepository;
#[cfg(test)]
pub use user::MockUserRepository;
#[cfg(test)]
pub use writer_request::MockWriterRequestRepository;
