//! User profile API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::{CreateUserInput, UpdateUserInput};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List users
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (users, total) = state
        .user_service
        .list(Some(&auth), pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        users,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get user by uid
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.get(Some(&auth), &uid).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Get the caller's own profile
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse> {
    let user = state.user_service.get(Some(&auth), &auth.uid).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Create the caller's profile
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateUserInput>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.create(Some(&auth), input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// Update a profile
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> Result<impl IntoResponse> {
    let user = state.user_service.update(Some(&auth), &uid, input).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// Delete a profile
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(uid): Path<String>,
) -> Result<impl IntoResponse> {
    state.user_service.delete(Some(&auth), &uid).await?;
    Ok(Json(MessageResponse::new("User deleted")))
}
