//! Domain models for InfoNest Core

pub mod activity;
pub mod article;
pub mod notification;
pub mod saved_article;
pub mod user;
pub mod writer_request;

pub use activity::*;
pub use article::*;
pub use notification::*;
pub use saved_article::*;
pub use user::*;
pub use writer_request::*;
