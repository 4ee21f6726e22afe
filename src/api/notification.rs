//! Notification API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::CreateNotificationInput;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List the caller's notifications (all rows for admins)
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (notifications, total) = state
        .notification_service
        .list(Some(&auth), pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        notifications,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get notification by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.get(Some(&auth), &id).await?;
    Ok(Json(SuccessResponse::new(notification)))
}

/// Create a notification (admin, or for oneself)
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateNotificationInput>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.create(Some(&auth), input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(notification))))
}

/// Mark a notification as read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let notification = state
        .notification_service
        .mark_read(Some(&auth), &id)
        .await?;
    Ok(Json(SuccessResponse::new(notification)))
}

/// Delete a notification
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.notification_service.delete(Some(&auth), &id).await?;
    Ok(Json(MessageResponse::new("Notification deleted")))
}
