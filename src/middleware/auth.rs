//! JWT authentication extractors.
//!
//! `AuthUser` for routes that require an authenticated caller, and
//! `OptionalAuth` for routes where anonymous access is legal (reading
//! published articles). The extracted identity feeds straight into the rule
//! engine's `Caller`.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use crate::jwt::IdentityClaims;
use crate::rules::Caller;
use crate::state::HasJwt;

/// Authenticated caller extracted from the bearer token
pub type AuthUser = Caller;

impl Caller {
    fn from_claims(claims: IdentityClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
        }
    }
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader,
    /// Token validation failed
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidHeader => "Invalid authorization header",
            AuthError::InvalidToken => "Invalid token",
        };

        let body = serde_json::json!({
            "error": "unauthorized",
            "message": message,
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extract and validate a Bearer token from the Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidHeader)
}

impl<S> FromRequestParts<S> for Caller
where
    S: HasJwt,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state
            .jwt_manager()
            .verify_identity_token(token)
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(Caller::from_claims(claims))
    }
}

/// Optional authentication extractor.
///
/// `Some(caller)` when a valid token is present, `None` otherwise.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Caller>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasJwt,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Caller::from_request_parts(parts, state).await {
            Ok(caller) => Ok(OptionalAuth(Some(caller))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer token-123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "token-123");
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let headers = axum::http::HeaderMap::new();
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::MissingToken)
        ));
    }

    #[test]
    fn test_extract_bearer_token_wrong_scheme() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(matches!(
            extract_bearer_token(&headers),
            Err(AuthError::InvalidHeader)
        ));
    }

    #[test]
    fn test_auth_error_responses_are_401() {
        for error in [
            AuthError::MissingToken,
            AuthError::InvalidHeader,
            AuthError::InvalidToken,
        ] {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_caller_from_claims() {
        let claims = IdentityClaims {
            sub: "U1".to_string(),
            email: "u1@example.com".to_string(),
            email_verified: true,
            iss: "infonest".to_string(),
            iat: 0,
            exp: 0,
        };
        let caller = Caller::from_claims(claims);
        assert_eq!(caller.uid, "U1");
        assert!(caller.email_verified);
    }
}
