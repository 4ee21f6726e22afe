//! Application state traits.
//!
//! The auth extractors only need the JWT manager, so they are generic over
//! this small trait instead of the concrete `AppState`; test states satisfy
//! it trivially.

use crate::jwt::JwtManager;

/// State that can verify bearer tokens
pub trait HasJwt: Clone + Send + Sync + 'static {
    fn jwt_manager(&self) -> &JwtManager;
}
