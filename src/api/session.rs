//! Session API handlers

use crate::api::{MessageResponse, SuccessResponse};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// The caller's derived permission set, cached or freshly computed
pub async fn permissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    let set = state.session_service.permissions_for(&auth.uid).await?;
    Ok(Json(SuccessResponse::new(set)))
}

/// Drop all cached session state for the caller
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse> {
    state.session_service.logout(&auth.uid).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}
