//! Writer request API handlers

use crate::api::{MessageResponse, PaginatedResponse, PaginationQuery, SuccessResponse};
use crate::domain::CreateWriterRequestInput;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

/// List writer requests (own rows, or all for admins)
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<impl IntoResponse> {
    let (requests, total) = state
        .writer_request_service
        .list(Some(&auth), pagination.offset(), pagination.per_page)
        .await?;

    Ok(Json(PaginatedResponse::new(
        requests,
        pagination.page,
        pagination.per_page,
        total,
    )))
}

/// Get writer request by ID
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let request = state.writer_request_service.get(Some(&auth), &id).await?;
    Ok(Json(SuccessResponse::new(request)))
}

/// File a writer request for the caller
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateWriterRequestInput>,
) -> Result<impl IntoResponse> {
    let request = state.writer_request_service.create(Some(&auth), input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(request))))
}

/// Approve a pending request (admin)
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let request = state.writer_request_service.approve(&auth, &id).await?;
    Ok(Json(SuccessResponse::new(request)))
}

/// Deny a pending request (admin)
pub async fn deny(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let request = state.writer_request_service.deny(&auth, &id).await?;
    Ok(Json(SuccessResponse::new(request)))
}

/// Delete a writer request (admin)
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.writer_request_service.delete(Some(&auth), &id).await?;
    Ok(Json(MessageResponse::new("Writer request deleted")))
}
