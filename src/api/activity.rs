//! User activity API handlers

use crate::api::{PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::RecordActivityInput;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List activity (own rows, or all for admins)
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (activities, total) = state
        .activity_service
        .list(Some(&auth), pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        activities,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get an activity record by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let activity = state.activity_service.get(Some(&auth), &id).await?;
    Ok(Json(SuccessResponse::new(activity)))
}

/// Record an activity event for the caller
pub async fn record(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<RecordActivityInput>,
) -> Result<impl IntoResponse> {
    let activity = state.activity_service.record(&auth, input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(activity))))
}
